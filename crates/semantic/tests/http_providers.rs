//! Remote embedders against a local mock API.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use semantic::{
    build_embedder, EmbeddingConfig, EmbeddingProvider, RetryConfig, SemanticError,
};

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<AtomicUsize>,
    /// Number of leading calls answered with 503.
    fail_first: usize,
    /// Status used for every call when set.
    always: Option<u16>,
    seen: Arc<Mutex<Vec<(String, HeaderMap, Value)>>>,
}

async fn handler(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let n = state.calls.fetch_add(1, Ordering::SeqCst);
    state
        .seen
        .lock()
        .unwrap()
        .push((uri.path().to_string(), headers, body.clone()));

    if let Some(status) = state.always {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, "nope").into_response();
    }
    if n < state.fail_first {
        return (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response();
    }

    if let Some(requests) = body.get("requests").and_then(Value::as_array) {
        let embeddings: Vec<Value> = requests
            .iter()
            .enumerate()
            .map(|(i, _)| json!({"values": [i as f32 + 1.0, 0.0]}))
            .collect();
        return Json(json!({ "embeddings": embeddings })).into_response();
    }

    let inputs = body["input"].as_array().cloned().unwrap_or_default();
    let data: Vec<Value> = inputs
        .iter()
        .enumerate()
        .rev()
        .map(|(i, _)| json!({"embedding": [0.0, i as f32 + 1.0], "index": i}))
        .collect();
    Json(json!({ "data": data })).into_response()
}

async fn spawn_mock(state: MockState) -> String {
    let app = Router::new().fallback(handler).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn fast_retry() -> RetryConfig {
    RetryConfig::default()
        .with_max_retries(3)
        .with_base_delay(Duration::from_millis(5))
        .with_jitter(false)
}

fn gemini_cfg(base: &str, batch_size: usize) -> EmbeddingConfig {
    EmbeddingConfig {
        provider: EmbeddingProvider::Gemini,
        base_url: Some(format!("{base}/v1beta")),
        api_key: Some("test-key".into()),
        batch_size,
        normalize: false,
        retry: fast_retry(),
        ..Default::default()
    }
}

#[tokio::test]
async fn gemini_batches_and_tags_task_types() {
    let state = MockState::default();
    let base = spawn_mock(state.clone()).await;
    let embedder = build_embedder(&gemini_cfg(&base, 2)).unwrap();

    let texts: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
    let vectors = embedder.embed_documents(&texts).await.unwrap();
    assert_eq!(vectors.len(), 3);
    assert_eq!(vectors[2], vec![1.0, 0.0]);

    embedder.embed_query("question").await.unwrap();

    let seen = state.seen.lock().unwrap();
    assert_eq!(seen.len(), 3, "two document batches and one query");
    let (path, headers, body) = &seen[0];
    assert_eq!(path, "/v1beta/models/embedding-001:batchEmbedContents");
    assert_eq!(headers["x-goog-api-key"], "test-key");
    assert_eq!(body["requests"].as_array().unwrap().len(), 2);
    assert_eq!(body["requests"][0]["taskType"], "RETRIEVAL_DOCUMENT");
    assert_eq!(seen[2].2["requests"][0]["taskType"], "RETRIEVAL_QUERY");
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let state = MockState {
        fail_first: 2,
        ..Default::default()
    };
    let base = spawn_mock(state.clone()).await;
    let embedder = build_embedder(&gemini_cfg(&base, 10)).unwrap();

    let vector = embedder.embed_query("fees").await.unwrap();
    assert_eq!(vector, vec![1.0, 0.0]);
    assert_eq!(state.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn client_errors_fail_fast() {
    let state = MockState {
        always: Some(401),
        ..Default::default()
    };
    let base = spawn_mock(state.clone()).await;
    let embedder = build_embedder(&gemini_cfg(&base, 10)).unwrap();

    let err = embedder.embed_query("fees").await.unwrap_err();
    assert!(matches!(err, SemanticError::Http { status: 401, .. }));
    assert_eq!(state.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn openai_sends_bearer_and_reorders() {
    let state = MockState::default();
    let base = spawn_mock(state.clone()).await;
    let cfg = EmbeddingConfig {
        provider: EmbeddingProvider::OpenAi,
        base_url: Some(format!("{base}/v1")),
        api_key: Some("sk-test".into()),
        normalize: false,
        retry: fast_retry(),
        ..Default::default()
    };
    let embedder = build_embedder(&cfg).unwrap();
    assert_eq!(embedder.model_id(), "openai:text-embedding-3-small");

    let vectors = embedder
        .embed_documents(&["x".to_string(), "y".to_string()])
        .await
        .unwrap();
    assert_eq!(vectors, vec![vec![0.0, 1.0], vec![0.0, 2.0]]);

    let seen = state.seen.lock().unwrap();
    assert_eq!(seen[0].0, "/v1/embeddings");
    assert_eq!(seen[0].1["authorization"], "Bearer sk-test");
    assert_eq!(seen[0].2["model"], "text-embedding-3-small");
}
