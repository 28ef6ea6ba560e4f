use async_trait::async_trait;
use fxhash::hash64;

use crate::error::SemanticError;
use crate::normalize::l2_normalize_in_place;
use crate::Embedder;

/// Deterministic offline embedder: hashed bag of lowercase words.
///
/// Texts sharing words get positive cosine similarity, which is enough for
/// retrieval tests and for running the service without an API key. The same
/// text always produces the same vector.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    dimension: usize,
    model_id: String,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            dimension,
            model_id: format!("stub-bow-{dimension}"),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            let slot = (hash64(word.as_bytes()) % self.dimension as u64) as usize;
            v[slot] += 1.0;
        }
        l2_normalize_in_place(&mut v);
        v
    }
}

impl Default for StubEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        Ok(self.embed_text(text))
    }
}
