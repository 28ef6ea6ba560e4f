use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SemanticError;
use crate::retry::RetryConfig;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_EMBEDDING_MODEL: &str = "models/embedding-001";
/// Upper bound on requests per `batchEmbedContents` call.
pub const GEMINI_MAX_BATCH: usize = 100;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Which service computes embeddings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Gemini,
    OpenAi,
    /// Deterministic local bag-of-words vectors. No network access.
    Stub,
}

impl EmbeddingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingProvider::Gemini => "gemini",
            EmbeddingProvider::OpenAi => "openai",
            EmbeddingProvider::Stub => "stub",
        }
    }

    /// Environment variable conventionally holding this provider's key.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            EmbeddingProvider::Gemini => Some("GOOGLE_API_KEY"),
            EmbeddingProvider::OpenAi => Some("OPENAI_API_KEY"),
            EmbeddingProvider::Stub => None,
        }
    }
}

/// Runtime configuration for the embedding stage.
///
/// # Example
/// ```
/// use semantic::{EmbeddingConfig, EmbeddingProvider};
///
/// let cfg = EmbeddingConfig {
///     provider: EmbeddingProvider::Stub,
///     ..Default::default()
/// };
/// cfg.validate().unwrap();
/// assert_eq!(cfg.model_name(), "stub-bow");
/// ```
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Provider model name. `None` picks the provider default.
    pub model: Option<String>,
    /// Override for the provider's API root (useful for proxies and tests).
    pub base_url: Option<String>,
    /// Never serialized back out.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum texts per provider request.
    pub batch_size: usize,
    /// Normalize vectors to unit length.
    pub normalize: bool,
    /// Vector width of the stub provider.
    pub stub_dimension: usize,
    pub retry: RetryConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Gemini,
            model: None,
            base_url: None,
            api_key: None,
            timeout_secs: 30,
            batch_size: GEMINI_MAX_BATCH,
            normalize: true,
            stub_dimension: 256,
            retry: RetryConfig::default(),
        }
    }
}

impl fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("batch_size", &self.batch_size)
            .field("normalize", &self.normalize)
            .field("stub_dimension", &self.stub_dimension)
            .field("retry", &self.retry)
            .finish()
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), SemanticError> {
        if self.batch_size == 0 {
            return Err(SemanticError::InvalidConfig(
                "batch_size must be greater than zero".into(),
            ));
        }
        if self.provider == EmbeddingProvider::Gemini && self.batch_size > GEMINI_MAX_BATCH {
            return Err(SemanticError::InvalidConfig(format!(
                "gemini accepts at most {GEMINI_MAX_BATCH} texts per batch, got {}",
                self.batch_size
            )));
        }
        if self.timeout_secs == 0 {
            return Err(SemanticError::InvalidConfig(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        if self.provider == EmbeddingProvider::Stub && self.stub_dimension == 0 {
            return Err(SemanticError::InvalidConfig(
                "stub_dimension must be greater than zero".into(),
            ));
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(SemanticError::InvalidConfig("model must not be empty".into()));
            }
        }
        Ok(())
    }

    pub fn model_name(&self) -> &str {
        if let Some(model) = self.model.as_deref() {
            return model;
        }
        match self.provider {
            EmbeddingProvider::Gemini => GEMINI_EMBEDDING_MODEL,
            EmbeddingProvider::OpenAi => OPENAI_EMBEDDING_MODEL,
            EmbeddingProvider::Stub => "stub-bow",
        }
    }

    pub fn base_url(&self) -> &str {
        let url = match (&self.base_url, self.provider) {
            (Some(url), _) => url.as_str(),
            (None, EmbeddingProvider::OpenAi) => OPENAI_BASE_URL,
            (None, _) => GEMINI_BASE_URL,
        };
        url.trim_end_matches('/')
    }

    /// The configured key, trimmed, or [`SemanticError::MissingApiKey`].
    pub(crate) fn require_api_key(&self) -> Result<&str, SemanticError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(SemanticError::MissingApiKey {
                provider: self.provider.as_str(),
                env: self.provider.api_key_env().unwrap_or("an API key"),
            }),
        }
    }
}
