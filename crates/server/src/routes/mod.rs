//! API route handlers
//!
//! - `ask`: question answering
//! - `health`: liveness and readiness probes

pub mod ask;
pub mod health;

use axum::Json;
use serde_json::{json, Value};

use crate::error::ServerError;

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Server is running!" }))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
