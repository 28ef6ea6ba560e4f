//! Text embeddings for docqa.
//!
//! This crate turns chunk text and questions into dense vectors for similarity
//! search. Everything goes through the [`Embedder`] trait so the indexer and
//! the responder never know which service is on the other end.
//!
//! We support three providers:
//!
//! - **Gemini** (default) - `batchEmbedContents` with `models/embedding-001`.
//!   Chunks are embedded as `RETRIEVAL_DOCUMENT`, questions as `RETRIEVAL_QUERY`.
//! - **OpenAI** - any OpenAI-compatible `/embeddings` endpoint.
//! - **Stub** - hashed bag of words. Deterministic, offline, good enough for tests.
//!
//! Remote calls have a per-request timeout and are retried with exponential
//! backoff when the failure looks transient (429, 408, 5xx, connect errors).
//! HTTP clients live on the embedder instance, not in globals.
//!
//! ## Quick example
//!
//! ```
//! use semantic::{build_embedder, EmbeddingConfig, EmbeddingProvider};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = EmbeddingConfig {
//!         provider: EmbeddingProvider::Stub,
//!         stub_dimension: 64,
//!         ..Default::default()
//!     };
//!     let embedder = build_embedder(&cfg).unwrap();
//!
//!     let vectors = embedder
//!         .embed_documents(&["Admission opens in June.".to_string()])
//!         .await
//!         .unwrap();
//!     assert_eq!(vectors[0].len(), 64);
//! }
//! ```
//!
//! ## Env vars to know
//!
//! The server fills [`EmbeddingConfig::api_key`] from `GOOGLE_API_KEY` or
//! `OPENAI_API_KEY`. This crate never reads the environment itself.
use std::sync::Arc;

use async_trait::async_trait;

mod config;
mod error;
mod gemini;
pub mod http;
mod normalize;
mod openai;
pub mod retry;
mod serde_millis;
mod stub;

pub use crate::config::{
    EmbeddingConfig, EmbeddingProvider, GEMINI_BASE_URL, GEMINI_EMBEDDING_MODEL,
    OPENAI_BASE_URL, OPENAI_EMBEDDING_MODEL,
};
pub use crate::error::{is_transient_status, SemanticError};
pub use crate::gemini::GeminiEmbedder;
pub use crate::normalize::l2_normalize_in_place;
pub use crate::openai::OpenAiEmbedder;
pub use crate::retry::{RetryConfig, Retryable};
pub use crate::stub::StubEmbedder;

/// Maps text to fixed-width vectors.
///
/// `model_id` identifies provider and model. The index stores it next to the
/// vectors so a query is never compared against vectors from another model.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    /// Embeds a batch of documents, one vector per input, in input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError>;

    /// Embeds a single search query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SemanticError>;
}

/// Builds the embedder selected by `cfg.provider`.
pub fn build_embedder(cfg: &EmbeddingConfig) -> Result<Arc<dyn Embedder>, SemanticError> {
    cfg.validate()?;
    let embedder: Arc<dyn Embedder> = match cfg.provider {
        EmbeddingProvider::Gemini => Arc::new(GeminiEmbedder::new(cfg)?),
        EmbeddingProvider::OpenAi => Arc::new(OpenAiEmbedder::new(cfg)?),
        EmbeddingProvider::Stub => Arc::new(StubEmbedder::new(cfg.stub_dimension)),
    };
    Ok(embedder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_needs_no_key() {
        let cfg = EmbeddingConfig {
            provider: EmbeddingProvider::Stub,
            stub_dimension: 12,
            ..Default::default()
        };
        let embedder = build_embedder(&cfg).unwrap();
        assert_eq!(embedder.model_id(), "stub-bow-12");
    }

    #[test]
    fn remote_providers_need_keys() {
        for provider in [EmbeddingProvider::Gemini, EmbeddingProvider::OpenAi] {
            let cfg = EmbeddingConfig {
                provider,
                ..Default::default()
            };
            assert!(matches!(
                build_embedder(&cfg),
                Err(SemanticError::MissingApiKey { .. })
            ));
        }
    }

    #[test]
    fn invalid_config_is_rejected_before_construction() {
        let cfg = EmbeddingConfig {
            provider: EmbeddingProvider::Stub,
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            build_embedder(&cfg),
            Err(SemanticError::InvalidConfig(_))
        ));
    }
}
