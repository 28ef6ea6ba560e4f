//! Answer generation for docqa.
//!
//! A [`Generator`] takes a fully rendered prompt and returns the model's text
//! unmodified. Two hosted providers are implemented: Gemini
//! (`gemini-2.0-flash` at temperature 0.3 by default) and any
//! OpenAI-compatible chat completions endpoint. Both share the retry policy
//! from [`semantic::retry`].
use std::sync::Arc;

use async_trait::async_trait;

mod config;
mod error;
mod gemini;
mod openai;

pub use crate::config::{
    GenerationConfig, GenerationProvider, GEMINI_BASE_URL, GEMINI_CHAT_MODEL, OPENAI_BASE_URL,
    OPENAI_CHAT_MODEL,
};
pub use crate::error::GenerateError;
pub use crate::gemini::GeminiGenerator;
pub use crate::openai::OpenAiGenerator;

/// Prompt in, text out.
#[async_trait]
pub trait Generator: Send + Sync {
    fn model_id(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// Builds the generator selected by `cfg.provider`.
pub fn build_generator(cfg: &GenerationConfig) -> Result<Arc<dyn Generator>, GenerateError> {
    let generator: Arc<dyn Generator> = match cfg.provider {
        GenerationProvider::Gemini => Arc::new(GeminiGenerator::new(cfg)?),
        GenerationProvider::OpenAi => Arc::new(OpenAiGenerator::new(cfg)?),
    };
    Ok(generator)
}
