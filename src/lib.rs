//! Retrieval-augmented question answering over a local document collection.
//!
//! The crate ties the pipeline stages together:
//!
//! - [`build_index`] reads the corpus directory, splits it into overlapping
//!   chunks, embeds them and commits a snapshot. The snapshot file doubles as
//!   the readiness marker.
//! - [`Responder::answer`] embeds a question, retrieves the closest chunks
//!   from the committed snapshot and asks the generation model for an answer
//!   grounded in them.
//!
//! Providers sit behind the [`Embedder`] and [`Generator`] traits, so tests
//! and offline runs can swap in deterministic implementations.
//!
//! ```no_run
//! use std::sync::Arc;
//! use docqa::{build_embedder, build_generator, build_index, PipelineConfig, Responder};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = PipelineConfig::default();
//! cfg.validate()?;
//! let embedder = build_embedder(&cfg.embedding)?;
//! let generator = build_generator(&cfg.generation)?;
//!
//! build_index(&cfg, embedder.as_ref()).await?;
//!
//! let responder = Responder::new(&cfg, cfg.prompt()?, embedder, generator);
//! let answer = responder.answer("When does admission open?").await;
//! println!("{}", answer.into_text(&cfg.messages));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod indexer;
pub mod prompt;
pub mod responder;

pub use config::{ConfigError, Messages, PipelineConfig, RetrievalConfig};
pub use error::{BuildError, ResponderError};
pub use indexer::{build_index, BuildReport, IndexBuildResult, SkipReason};
pub use prompt::{PromptError, PromptTemplate, DEFAULT_PROMPT_TEMPLATE};
pub use responder::{Answer, Responder};

pub use generate::{build_generator, GenerateError, GenerationConfig, GenerationProvider, Generator};
pub use index::{IndexConfig, IndexError, IndexStore, SearchHit};
pub use ingest::{ChunkingConfig, CorpusConfig, IngestError};
pub use semantic::{
    build_embedder, EmbeddingConfig, EmbeddingProvider, Embedder, RetryConfig, SemanticError,
    StubEmbedder,
};
