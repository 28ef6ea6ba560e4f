use std::sync::Arc;
use std::time::Instant;

use docqa::{Messages, Responder};
use serde::Serialize;
use tokio::sync::watch;

use crate::config::ServerConfig;

/// Progress of the startup index build, as reported by `/ready`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BuildStatus {
    Pending,
    Building,
    Built {
        documents: usize,
        chunks: usize,
        elapsed_ms: u64,
    },
    /// No usable documents. Questions get the "initializing" answer.
    Skipped { reason: String },
    Failed { error: String },
}

impl BuildStatus {
    /// True once the build has stopped, whatever the result.
    pub fn is_finished(&self) -> bool {
        !matches!(self, BuildStatus::Pending | BuildStatus::Building)
    }
}

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    pub responder: Responder,

    build_status: watch::Receiver<BuildStatus>,

    started_at: Instant,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        responder: Responder,
        build_status: watch::Receiver<BuildStatus>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            responder,
            build_status,
            started_at: Instant::now(),
        }
    }

    pub fn messages(&self) -> &Messages {
        &self.config.pipeline.messages
    }

    pub fn build_status(&self) -> BuildStatus {
        self.build_status.borrow().clone()
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
