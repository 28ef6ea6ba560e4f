//! Pipeline configuration shared by the indexer and the responder.
//!
//! One [`PipelineConfig`] is built at startup (usually by the server's config
//! loader) and passed by reference; nothing here reads the environment.
//!
//! ```
//! use docqa::PipelineConfig;
//!
//! let cfg = PipelineConfig::default();
//! assert_eq!(cfg.retrieval.top_k, 4);
//! assert_eq!(cfg.chunking.chunk_size, 10_000);
//! cfg.validate().unwrap();
//! ```
use generate::{GenerateError, GenerationConfig};
use index::IndexConfig;
use ingest::{ChunkingConfig, ChunkingError, CorpusConfig};
use semantic::{EmbeddingConfig, SemanticError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prompt::{PromptError, PromptTemplate, DEFAULT_PROMPT_TEMPLATE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("chunking: {0}")]
    Chunking(#[from] ChunkingError),
    #[error("embedding: {0}")]
    Embedding(#[from] SemanticError),
    #[error("generation: {0}")]
    Generation(#[from] GenerateError),
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),
    #[error("retrieval: {0}")]
    Retrieval(String),
    #[error("messages: {0}")]
    Messages(String),
}

/// How many chunks to retrieve and how similar they must be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Chunks with a cosine similarity below this are dropped. `None` keeps all `top_k`.
    pub min_similarity: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_similarity: None,
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 {
            return Err(ConfigError::Retrieval("top_k must be at least 1".into()));
        }
        if let Some(min) = self.min_similarity {
            if !(-1.0..=1.0).contains(&min) {
                return Err(ConfigError::Retrieval(format!(
                    "min_similarity must be within -1.0..=1.0, got {min}"
                )));
            }
        }
        Ok(())
    }
}

/// Fixed user-facing texts for the non-generated outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub not_ready: String,
    pub no_context: String,
    /// `{error}` is replaced with the failure detail.
    pub provider_error: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            not_ready: "⏳ The system is still initializing. Please try again in a moment.".into(),
            no_context: "Apologies! There is no information available regarding your query."
                .into(),
            provider_error: "❌ Error retrieving answer: {error}".into(),
        }
    }
}

impl Messages {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, text) in [
            ("not_ready", &self.not_ready),
            ("no_context", &self.no_context),
            ("provider_error", &self.provider_error),
        ] {
            if text.trim().is_empty() {
                return Err(ConfigError::Messages(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }

    pub fn provider_error(&self, detail: &str) -> String {
        self.provider_error.replace("{error}", detail)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub corpus: CorpusConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub messages: Messages,
    pub prompt_template: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig::default(),
            chunking: ChunkingConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
            messages: Messages::default(),
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Checks every section. API keys are not required here; providers check
    /// them when they are built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        self.embedding.validate()?;
        self.generation.validate()?;
        self.retrieval.validate()?;
        self.messages.validate()?;
        self.prompt()?;
        Ok(())
    }

    pub fn prompt(&self) -> Result<PromptTemplate, PromptError> {
        PromptTemplate::new(self.prompt_template.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_message_inserts_detail() {
        let messages = Messages::default();
        assert_eq!(
            messages.provider_error("HTTP 503"),
            "❌ Error retrieving answer: HTTP 503"
        );
    }

    #[test]
    fn zero_top_k_is_invalid() {
        let cfg = PipelineConfig {
            retrieval: RetrievalConfig {
                top_k: 0,
                min_similarity: None,
            },
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Retrieval(_))));
    }

    #[test]
    fn template_without_placeholders_is_invalid() {
        let cfg = PipelineConfig {
            prompt_template: "Just answer.".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Prompt(_))));
    }

    #[test]
    fn bad_chunking_is_invalid() {
        let cfg = PipelineConfig {
            chunking: ChunkingConfig::new(10, 9),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Chunking(_))));
    }

    #[test]
    fn blank_messages_are_invalid() {
        let cfg = PipelineConfig {
            messages: Messages {
                no_context: "  ".into(),
                ..Messages::default()
            },
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Messages(_))));
    }
}
