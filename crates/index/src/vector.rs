use crate::ann::{AnnConfig, AnnIndex};
use crate::error::IndexError;
use crate::snapshot::Snapshot;

/// A retrieved chunk and its cosine similarity to the query (1.0 = identical direction).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub text: String,
    pub score: f32,
}

/// In-memory searchable form of a [`Snapshot`].
pub struct VectorIndex {
    embedding_model: String,
    build_id: u64,
    texts: Vec<String>,
    ann: AnnIndex,
}

impl VectorIndex {
    pub fn from_snapshot(snapshot: Snapshot, config: AnnConfig) -> Result<Self, IndexError> {
        let mut ann = AnnIndex::new(snapshot.dimension, config);
        let mut texts = Vec::with_capacity(snapshot.entries.len());
        for entry in snapshot.entries {
            ann.insert(entry.vector)?;
            texts.push(entry.text);
        }
        ann.build();
        Ok(Self {
            embedding_model: snapshot.embedding_model,
            build_id: snapshot.build_id,
            texts,
            ann,
        })
    }

    /// The `k` chunks closest to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        let results = self.ann.search(query, k)?;
        Ok(results
            .into_iter()
            .filter_map(|r| {
                self.texts.get(r.index).map(|text| SearchHit {
                    text: text.clone(),
                    score: 1.0 - r.distance,
                })
            })
            .collect())
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Id of the build this index was loaded from.
    pub fn build_id(&self) -> u64 {
        self.build_id
    }

    pub fn dimension(&self) -> usize {
        self.ann.dimension()
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}
