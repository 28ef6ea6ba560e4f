//! Server initialization and routing
//!
//! This module handles the Axum server setup:
//! - Router configuration and the middleware stack
//! - Tracing initialisation
//! - The startup index build
//! - Graceful shutdown handling

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use docqa::Responder;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{IndexBuildMode, ServerConfig};
use crate::error::ServerResult;
use crate::middleware::{log_requests, request_id};
use crate::routes::{ask, health, not_found, root};
use crate::startup::{spawn_index_build, wait_for_build, Providers};
use crate::state::{BuildStatus, ServerState};

/// CORS policy for the configured origins.
///
/// A wildcard origin never allows credentials. With an explicit origin list,
/// credentials follow `allow_credentials`.
pub fn cors_layer(config: &ServerConfig) -> ServerResult<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request());

    if config.any_origin() {
        return Ok(cors.allow_origin(Any));
    }
    Ok(cors
        .allow_origin(AllowOrigin::list(config.origin_header_values()?))
        .allow_credentials(config.allow_credentials))
}

/// Build the Axum router with all routes and middleware
///
/// Middleware, outermost first:
/// 1. Tracing spans
/// 2. Request ID tracking
/// 3. Request logging
/// 4. CORS
/// 5. Compression
/// 6. Timeout
/// 7. Body size limit
pub fn build_router(state: Arc<ServerState>) -> ServerResult<Router> {
    let cors = cors_layer(&state.config)?;

    Ok(Router::new()
        .route("/", get(root))
        .route("/ask", post(ask::ask))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.layer_timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Initialises the global tracing subscriber. `RUST_LOG` wins over
/// `log_level` when set.
pub fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .with_context(|| format!("invalid log_level {:?}", config.log_level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    let result = if config.log_json {
        builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!(e))
}

/// Start the docqa HTTP server
///
/// 1. Sets up logging with the configured level and format
/// 2. Builds the embedding and generation clients
/// 3. Builds the index, before binding in `blocking` mode or in a supervised
///    task in `background` mode
/// 4. Binds and serves until Ctrl+C or SIGTERM
///
/// Returns an error only when startup fails. An empty or missing corpus is
/// not a startup failure: the server runs and answers with the
/// "initializing" message.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config)?;
    config.validate()?;

    let providers = Providers::from_config(&config.pipeline)?;
    let template = config.pipeline.prompt()?;

    let (status_tx, mut status_rx) = watch::channel(BuildStatus::Pending);
    let build = spawn_index_build(
        config.pipeline.clone(),
        providers.embedder.clone(),
        status_tx,
    );
    match config.index_build {
        IndexBuildMode::Blocking => {
            build.await.context("index build task")?;
            let status = wait_for_build(&mut status_rx).await;
            tracing::info!(status = ?status, "index_build_finished");
        }
        IndexBuildMode::Background => {
            tracing::info!("index_build_started_in_background");
        }
    }

    let responder = Responder::new(
        &config.pipeline,
        template,
        providers.embedder,
        providers.generator,
    );
    let state = Arc::new(ServerState::new(config.clone(), responder, status_rx));
    let app = build_router(state)?;

    let addr: SocketAddr = config.socket_addr()?;
    tracing::info!(
        addr = %addr,
        timeout_secs = config.timeout_secs,
        max_body_mb = config.max_body_size_mb,
        origins = ?config.allowed_origins,
        index_dir = %config.pipeline.index.dir.display(),
        "server_starting"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server_stopped");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl_c_handler_failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "sigterm_handler_failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
