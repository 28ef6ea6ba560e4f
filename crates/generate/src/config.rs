use std::fmt;

use semantic::RetryConfig;
use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_CHAT_MODEL: &str = "gemini-2.0-flash";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OPENAI_CHAT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    #[default]
    Gemini,
    OpenAi,
}

impl GenerationProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationProvider::Gemini => "gemini",
            GenerationProvider::OpenAi => "openai",
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            GenerationProvider::Gemini => "GOOGLE_API_KEY",
            GenerationProvider::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Runtime configuration for the answer model.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: GenerationProvider,
    /// `None` picks the provider default.
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub timeout_secs: u64,
    pub retry: RetryConfig,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::Gemini,
            model: None,
            base_url: None,
            api_key: None,
            temperature: 0.3,
            max_output_tokens: None,
            timeout_secs: 60,
            retry: RetryConfig::default(),
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), GenerateError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(GenerateError::InvalidConfig(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.timeout_secs == 0 {
            return Err(GenerateError::InvalidConfig(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        if self.max_output_tokens == Some(0) {
            return Err(GenerateError::InvalidConfig(
                "max_output_tokens must be greater than zero".into(),
            ));
        }
        if matches!(&self.model, Some(m) if m.trim().is_empty()) {
            return Err(GenerateError::InvalidConfig("model must not be empty".into()));
        }
        Ok(())
    }

    pub fn model_name(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model.as_str(),
            (None, GenerationProvider::Gemini) => GEMINI_CHAT_MODEL,
            (None, GenerationProvider::OpenAi) => OPENAI_CHAT_MODEL,
        }
    }

    pub fn base_url(&self) -> &str {
        let url = match (&self.base_url, self.provider) {
            (Some(url), _) => url.as_str(),
            (None, GenerationProvider::Gemini) => GEMINI_BASE_URL,
            (None, GenerationProvider::OpenAi) => OPENAI_BASE_URL,
        };
        url.trim_end_matches('/')
    }

    pub(crate) fn require_api_key(&self) -> Result<&str, GenerateError> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(GenerateError::MissingApiKey {
                provider: self.provider.as_str(),
                env: self.provider.api_key_env(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_gemini() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.model_name(), "gemini-2.0-flash");
        assert!((cfg.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(cfg.base_url(), GEMINI_BASE_URL);
        cfg.validate().unwrap();
    }

    #[test]
    fn temperature_out_of_range() {
        let cfg = GenerationConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(GenerateError::InvalidConfig(_))));
    }

    #[test]
    fn key_is_redacted() {
        let cfg = GenerationConfig {
            provider: GenerationProvider::OpenAi,
            api_key: Some("sk-live-123".into()),
            ..Default::default()
        };
        assert!(!format!("{cfg:?}").contains("sk-live-123"));
        assert_eq!(cfg.require_api_key().unwrap(), "sk-live-123");
        assert_eq!(cfg.model_name(), OPENAI_CHAT_MODEL);
    }
}
