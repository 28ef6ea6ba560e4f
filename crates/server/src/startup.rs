//! Startup work that happens before or alongside serving: provider
//! construction and the index build.
use std::sync::Arc;

use docqa::{
    build_embedder, build_generator, build_index, BuildError, Embedder, Generator,
    IndexBuildResult, PipelineConfig,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::ServerResult;
use crate::state::BuildStatus;

/// The external model clients, built once and shared by the indexer and the
/// responder.
#[derive(Clone)]
pub struct Providers {
    pub embedder: Arc<dyn Embedder>,
    pub generator: Arc<dyn Generator>,
}

impl Providers {
    /// Builds both clients. A missing API key is reported here, before any
    /// document is read.
    pub fn from_config(cfg: &PipelineConfig) -> ServerResult<Self> {
        let embedder = build_embedder(&cfg.embedding)?;
        let generator = build_generator(&cfg.generation)?;
        info!(
            embedding_model = embedder.model_id(),
            generation_model = generator.model_id(),
            "providers_ready"
        );
        Ok(Self {
            embedder,
            generator,
        })
    }
}

/// Runs the index build in its own task and publishes progress on `status`.
///
/// The build runs inside a nested task so a panic is caught and reported as
/// [`BuildStatus::Failed`] instead of tearing down the server. The returned
/// handle finishes once the final status has been published.
pub fn spawn_index_build(
    cfg: PipelineConfig,
    embedder: Arc<dyn Embedder>,
    status: watch::Sender<BuildStatus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        status.send_replace(BuildStatus::Building);

        let build = tokio::spawn(async move { build_index(&cfg, embedder.as_ref()).await });
        let finished = match build.await {
            Ok(result) => status_for(result),
            Err(err) => {
                error!(error = %err, "index_build_panicked");
                BuildStatus::Failed {
                    error: format!("index build task failed: {err}"),
                }
            }
        };
        status.send_replace(finished);
    })
}

fn status_for(result: Result<IndexBuildResult, BuildError>) -> BuildStatus {
    match result {
        Ok(IndexBuildResult::Built(report)) => BuildStatus::Built {
            documents: report.documents,
            chunks: report.chunks,
            elapsed_ms: report.elapsed.as_millis() as u64,
        },
        Ok(IndexBuildResult::Skipped(reason)) => BuildStatus::Skipped {
            reason: reason.to_string(),
        },
        Err(err) => {
            error!(error = %err, "index_build_failed");
            BuildStatus::Failed {
                error: err.to_string(),
            }
        }
    }
}

/// Waits until the build publishes a finished status.
pub async fn wait_for_build(status: &mut watch::Receiver<BuildStatus>) -> BuildStatus {
    let finished = status
        .wait_for(BuildStatus::is_finished)
        .await
        .map(|s| s.clone());
    finished.unwrap_or_else(|_| status.borrow().clone())
}
