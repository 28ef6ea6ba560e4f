//! Google Generative Language embeddings (`batchEmbedContents`).
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;
use crate::error::SemanticError;
use crate::http::{build_client, post_json_with_retry};
use crate::normalize::l2_normalize_in_place;
use crate::retry::RetryConfig;
use crate::Embedder;

/// Embeds through the Gemini API. Documents and queries use different task types.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    model_id: String,
    batch_size: usize,
    normalize: bool,
    retry: RetryConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl GeminiEmbedder {
    pub fn new(cfg: &EmbeddingConfig) -> Result<Self, SemanticError> {
        cfg.validate()?;
        let key = cfg.require_api_key()?;
        let client = build_client::<SemanticError>(
            Duration::from_secs(cfg.timeout_secs),
            (HeaderName::from_static("x-goog-api-key"), key.to_string()),
        )?;

        let model = qualified_model(cfg.model_name());
        let endpoint = format!("{}/{}:batchEmbedContents", cfg.base_url(), model);
        Ok(Self {
            client,
            endpoint,
            model_id: format!("gemini:{model}"),
            model,
            batch_size: cfg.batch_size,
            normalize: cfg.normalize,
            retry: cfg.retry,
        })
    }

    async fn embed_batch(
        &self,
        texts: &[&str],
        task_type: TaskType,
    ) -> Result<Vec<Vec<f32>>, SemanticError> {
        let request = build_request(&self.model, texts, task_type);
        let response: BatchEmbedResponse = post_json_with_retry::<_, _, SemanticError>(
            &self.client,
            &self.endpoint,
            &request,
            &self.retry,
            "gemini",
        )
        .await?;

        if response.embeddings.len() != texts.len() {
            return Err(SemanticError::CountMismatch {
                expected: texts.len(),
                actual: response.embeddings.len(),
            });
        }
        let mut vectors: Vec<Vec<f32>> =
            response.embeddings.into_iter().map(|e| e.values).collect();
        if self.normalize {
            vectors.iter_mut().for_each(|v| l2_normalize_in_place(v));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let refs: Vec<&str> = batch.iter().map(String::as_str).collect();
            out.extend(self.embed_batch(&refs, TaskType::RetrievalDocument).await?);
        }
        Ok(out)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let mut vectors = self.embed_batch(&[text], TaskType::RetrievalQuery).await?;
        vectors.pop().ok_or(SemanticError::CountMismatch {
            expected: 1,
            actual: 0,
        })
    }
}

/// The API wants `models/<name>`; accept bare names too.
fn qualified_model(name: &str) -> String {
    if name.starts_with("models/") {
        name.to_string()
    } else {
        format!("models/{name}")
    }
}

fn build_request<'a>(
    model: &'a str,
    texts: &[&'a str],
    task_type: TaskType,
) -> BatchEmbedRequest<'a> {
    BatchEmbedRequest {
        requests: texts
            .iter()
            .map(|&text| EmbedContentRequest {
                model,
                content: Content {
                    parts: [Part { text }],
                },
                task_type,
            })
            .collect(),
    }
}
