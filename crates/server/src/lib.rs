//! docqa server - HTTP API for question answering over a document collection
//!
//! On startup the server builds (or rebuilds) the vector index from the
//! configured corpus directory, then answers questions against it.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - `{"message": "Server is running!"}`
//! - `POST /ask` - `{"question": "..."}` → `{"answer": "..."}`, always 200 for a
//!   valid body. The `x-answer-outcome` header names the outcome.
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe: 200 once an index is committed, 503 before
//!
//! # Configuration
//!
//! [`ServerConfig::load`] reads `.env`, an optional `docqa.toml` (or `.yaml`,
//! `.json`), `DOCQA__*` environment variables and finally `PORT`,
//! `FRONTEND_URL`, `GOOGLE_API_KEY` and `OPENAI_API_KEY`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod startup;
pub mod state;

pub use config::{IndexBuildMode, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use startup::{spawn_index_build, Providers};
pub use state::{BuildStatus, ServerState};
