use thiserror::Error;

use crate::retry::Retryable;

/// Errors surfaced by embedding providers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SemanticError {
    /// Configuration is inconsistent (zero batch size, bad base URL, ...).
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
    /// The selected provider needs an API key and none was configured.
    #[error("missing API key for {provider} (set {env})")]
    MissingApiKey {
        provider: &'static str,
        env: &'static str,
    },
    /// The provider answered with a non-success status.
    #[error("embedding request failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("embedding request failed: {message}")]
    Transport { message: String, retryable: bool },
    /// The response body did not have the expected shape.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    /// The provider returned a different number of vectors than inputs.
    #[error("provider returned {actual} embeddings for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

impl Retryable for SemanticError {
    fn is_retryable(&self) -> bool {
        match self {
            SemanticError::Http { status, .. } => is_transient_status(*status),
            SemanticError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SemanticError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return SemanticError::InvalidResponse(err.to_string());
        }
        SemanticError::Transport {
            retryable: err.is_timeout() || err.is_connect() || err.is_request(),
            message: err.to_string(),
        }
    }
}

/// 408, 429 and every 5xx are worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 500..=599)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_errors_classify_by_status() {
        let http = |status| SemanticError::Http {
            status,
            body: String::new(),
        };
        assert!(http(429).is_retryable());
        assert!(http(503).is_retryable());
        assert!(http(408).is_retryable());
        assert!(!http(400).is_retryable());
        assert!(!http(401).is_retryable());
        assert!(!http(404).is_retryable());
    }

    #[test]
    fn config_and_shape_errors_are_final() {
        assert!(!SemanticError::InvalidConfig("x".into()).is_retryable());
        assert!(!SemanticError::InvalidResponse("x".into()).is_retryable());
        assert!(!SemanticError::CountMismatch {
            expected: 2,
            actual: 1
        }
        .is_retryable());
    }

    #[test]
    fn missing_key_names_the_variable() {
        let err = SemanticError::MissingApiKey {
            provider: "gemini",
            env: "GOOGLE_API_KEY",
        };
        assert_eq!(
            err.to_string(),
            "missing API key for gemini (set GOOGLE_API_KEY)"
        );
    }
}
