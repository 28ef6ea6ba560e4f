use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderName, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use docqa::Answer;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;

/// Names the answer outcome: `generated`, `not_ready`, `no_context` or
/// `provider_error`.
pub const OUTCOME_HEADER: &str = "x-answer-outcome";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

/// `POST /ask`
///
/// Always 200 once the body is valid. Readiness, empty retrieval and provider
/// failures are all reported as answer text; the outcome header tells them
/// apart. An answer that outlasts `timeout_secs` is a provider error.
pub async fn ask(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(request) = payload
        .map_err(|r| ServerError::from_json_rejection(r, state.config.max_body_size_mb))?;

    let deadline = state.config.timeout();
    let answer = match tokio::time::timeout(deadline, state.responder.answer(&request.question))
        .await
    {
        Ok(answer) => answer,
        Err(_) => {
            tracing::warn!(timeout_secs = deadline.as_secs(), "answer_timed_out");
            Answer::ProviderError(format!("timed out after {}s", deadline.as_secs()))
        }
    };
    let outcome = answer.outcome();
    tracing::info!(
        outcome,
        question_chars = request.question.chars().count(),
        "question_answered"
    );

    let body = AskResponse {
        answer: answer.into_text(state.messages()),
    };
    Ok((
        [(
            HeaderName::from_static(OUTCOME_HEADER),
            HeaderValue::from_static(outcome),
        )],
        Json(body),
    ))
}
