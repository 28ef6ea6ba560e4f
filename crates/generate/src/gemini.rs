//! Gemini `generateContent`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderName;
use semantic::http::{build_client, post_json_with_retry};
use semantic::RetryConfig;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::GenerationConfig;
use crate::error::GenerateError;
use crate::Generator;

pub struct GeminiGenerator {
    client: reqwest::Client,
    endpoint: String,
    model_id: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
    retry: RetryConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationSettings,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiGenerator {
    pub fn new(cfg: &GenerationConfig) -> Result<Self, GenerateError> {
        cfg.validate()?;
        let key = cfg.require_api_key()?;
        let client = build_client::<GenerateError>(
            Duration::from_secs(cfg.timeout_secs),
            (HeaderName::from_static("x-goog-api-key"), key.to_string()),
        )?;
        let model = cfg.model_name().trim_start_matches("models/");
        Ok(Self {
            client,
            endpoint: format!("{}/models/{model}:generateContent", cfg.base_url()),
            model_id: format!("gemini:{model}"),
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
            retry: cfg.retry,
        })
    }

    fn request<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationSettings {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let request = self.request(prompt);
        let response: GenerateContentResponse = post_json_with_retry::<_, _, GenerateError>(
            &self.client,
            &self.endpoint,
            &request,
            &self.retry,
            "gemini",
        )
        .await?;
        extract_text(response)
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Result<String, GenerateError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        warn!(reason = %reason, "gemini_prompt_blocked");
        return Err(GenerateError::Blocked(reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if !text.is_empty() {
        return Ok(text);
    }
    match candidate.finish_reason.as_deref() {
        Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
            Err(GenerateError::Blocked(reason.to_string()))
        }
        _ => Err(GenerateError::Empty),
    }
}
