//! JSON-over-HTTP plumbing shared by the remote embedders and generators.
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::SemanticError;
use crate::retry::{execute_with_retry_async, RetryConfig, Retryable};

/// Longest error body kept in a provider's HTTP error.
pub const MAX_ERROR_BODY: usize = 512;

/// Provider error types the shared helpers can build.
pub trait ProviderHttpError: From<reqwest::Error> + Retryable {
    fn invalid_config(message: String) -> Self;
    fn status(status: u16, body: String) -> Self;
    fn invalid_response(message: String) -> Self;
}

impl ProviderHttpError for SemanticError {
    fn invalid_config(message: String) -> Self {
        SemanticError::InvalidConfig(message)
    }

    fn status(status: u16, body: String) -> Self {
        SemanticError::Http { status, body }
    }

    fn invalid_response(message: String) -> Self {
        SemanticError::InvalidResponse(message)
    }
}

/// Builds a client carrying `auth` as a default header.
pub fn build_client<E: ProviderHttpError>(
    timeout: Duration,
    auth: (HeaderName, String),
) -> Result<reqwest::Client, E> {
    let (name, value) = auth;
    let mut headers = HeaderMap::new();
    let mut value = HeaderValue::from_str(&value)
        .map_err(|_| E::invalid_config("API key is not a valid header value".into()))?;
    value.set_sensitive(true);
    headers.insert(name, value);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .default_headers(headers)
        .build()
        .map_err(|e| E::invalid_config(format!("failed to build HTTP client: {e}")))
}

pub async fn post_json<B, R, E>(client: &reqwest::Client, url: &str, body: &B) -> Result<R, E>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
    E: ProviderHttpError,
{
    let response = client.post(url).json(body).send().await?;
    let status = response.status();
    if !status.is_success() {
        let mut body = response.text().await.unwrap_or_default();
        truncate_utf8(&mut body, MAX_ERROR_BODY);
        return Err(E::status(status.as_u16(), body));
    }
    response
        .json::<R>()
        .await
        .map_err(|e| E::invalid_response(e.to_string()))
}

/// [`post_json`] under the configured retry policy.
pub async fn post_json_with_retry<B, R, E>(
    client: &reqwest::Client,
    url: &str,
    body: &B,
    retry: &RetryConfig,
    provider: &'static str,
) -> Result<R, E>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
    E: ProviderHttpError,
{
    let outcome = execute_with_retry_async(retry, |attempt| async move {
        if attempt > 0 {
            debug!(provider, attempt, "provider_request_retry");
        }
        post_json(client, url, body).await
    })
    .await;
    if !outcome.succeeded && outcome.attempts > 1 {
        debug!(provider, attempts = outcome.attempts, "provider_request_gave_up");
    }
    outcome.into_result()
}

fn truncate_utf8(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
