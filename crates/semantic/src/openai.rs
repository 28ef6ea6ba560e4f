//! OpenAI-compatible `/embeddings` client.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::SemanticError;
use crate::http::{build_client, post_json_with_retry};
use crate::normalize::l2_normalize_in_place;
use crate::retry::RetryConfig;
use crate::Embedder;

pub struct OpenAiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    model_id: String,
    batch_size: usize,
    normalize: bool,
    retry: RetryConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiEmbedder {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let key = cfg.require_api_key()?;
        let client = build_client::<SemanticError>(
            Duration::from_secs(cfg.timeout_secs),
            (AUTHORIZATION, format!("Bearer {key}")),
        )?;
        let model = cfg.model_name().to_string();
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", cfg.base_url()),
            model_id: format!("openai:{model}"),
            model,
            batch_size: cfg.batch_size,
            normalize: cfg.normalize,
            retry: cfg.retry,
        })
    }

    async fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };
        let response: EmbeddingResponse = post_json_with_retry::<_, _, SemanticError>(
            &self.client,
            &self.endpoint,
            &request,
            &self.retry,
            "openai",
        )
        .await?;
        let mut vectors = into_ordered_vectors(response, inputs.len())?;
        if self.normalize {
            vectors.iter_mut().for_each(|v| l2_normalize_in_place(v));
        }
        Ok(vectors)
    }
}

/// Orders `data` by `index`; the API does not promise input order.
fn into_ordered_vectors(
    mut response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    if response.data.len() != expected {
        return Err(SemanticError::CountMismatch {
            expected,
            actual: response.data.len(),
        });
    }
    response.data.sort_by_key(|entry| entry.index);
    Ok(response.data.into_iter().map(|entry| entry.embedding).collect())
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            out.extend(self.embed_batch(&refs).await?);
        }
        Ok(out)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or(SemanticError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}
