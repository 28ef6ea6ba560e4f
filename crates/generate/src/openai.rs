//! OpenAI-compatible `/chat/completions`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use semantic::http::{build_client, post_json_with_retry};
use semantic::RetryConfig;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::error::GenerateError;
use crate::Generator;

pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    model_id: String,
    temperature: f32,
    max_output_tokens: Option<u32>,
    retry: RetryConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(cfg: &GenerationConfig) -> Result<Self, GenerateError> {
        cfg.validate()?;
        let key = cfg.require_api_key()?;
        let client = build_client::<GenerateError>(
            Duration::from_secs(cfg.timeout_secs),
            (AUTHORIZATION, format!("Bearer {key}")),
        )?;
        let model = cfg.model_name().to_string();
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", cfg.base_url()),
            model_id: format!("openai:{model}"),
            model,
            temperature: cfg.temperature,
            max_output_tokens: cfg.max_output_tokens,
            retry: cfg.retry,
        })
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let response: ChatResponse = post_json_with_retry::<_, _, GenerateError>(
            &self.client,
            &self.endpoint,
            &request,
            &self.retry,
            "openai",
        )
        .await?;
        first_choice_text(response)
    }
}

fn first_choice_text(response: ChatResponse) -> Result<String, GenerateError> {
    response
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content.filter(|c| !c.is_empty()))
        .ok_or(GenerateError::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn takes_first_non_empty_choice() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [
                {"message": {"role": "assistant", "content": null}},
                {"message": {"role": "assistant", "content": "June."}}
            ]
        }))
        .unwrap();
        assert_eq!(first_choice_text(response).unwrap(), "June.");
    }

    #[test]
    fn no_choices_is_empty() {
        let response: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(first_choice_text(response).unwrap_err(), GenerateError::Empty);
    }
}
