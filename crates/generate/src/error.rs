use semantic::http::ProviderHttpError;
use semantic::is_transient_status;
use semantic::retry::Retryable;
use thiserror::Error;

/// Errors surfaced by answer generators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("invalid generation config: {0}")]
    InvalidConfig(String),
    #[error("missing API key for {provider} (set {env})")]
    MissingApiKey {
        provider: &'static str,
        env: &'static str,
    },
    #[error("generation request failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("generation request failed: {message}")]
    Transport { message: String, retryable: bool },
    #[error("invalid generation response: {0}")]
    InvalidResponse(String),
    /// The provider refused the prompt (safety filters and the like).
    #[error("prompt was blocked: {0}")]
    Blocked(String),
    #[error("model returned no text")]
    Empty,
}

impl Retryable for GenerateError {
    fn is_retryable(&self) -> bool {
        match self {
            GenerateError::Http { status, .. } => is_transient_status(*status),
            GenerateError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return GenerateError::InvalidResponse(err.to_string());
        }
        GenerateError::Transport {
            retryable: err.is_timeout() || err.is_connect() || err.is_request(),
            message: err.to_string(),
        }
    }
}

impl ProviderHttpError for GenerateError {
    fn invalid_config(message: String) -> Self {
        GenerateError::InvalidConfig(message)
    }

    fn status(status: u16, body: String) -> Self {
        GenerateError::Http { status, body }
    }

    fn invalid_response(message: String) -> Self {
        GenerateError::InvalidResponse(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        let http = |status| GenerateError::Http {
            status,
            body: String::new(),
        };
        assert!(http(429).is_retryable());
        assert!(http(500).is_retryable());
        assert!(!http(403).is_retryable());
        assert!(!GenerateError::Blocked("SAFETY".into()).is_retryable());
        assert!(!GenerateError::Empty.is_retryable());
    }
}
