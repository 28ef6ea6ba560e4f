use generate::GenerateError;
use index::IndexError;
use ingest::ChunkingError;
use semantic::SemanticError;
use thiserror::Error;

/// Failures of an index build that got past corpus loading.
///
/// A missing or empty corpus is not an error; see
/// [`IndexBuildResult::Skipped`](crate::IndexBuildResult::Skipped). When a
/// build fails the previously committed snapshot, if any, is left in place.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("chunking failed: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("embedding failed: {0}")]
    Embedding(#[from] SemanticError),

    #[error("index write failed: {0}")]
    Index(#[from] IndexError),

    #[error("embedder returned {actual} vectors for {expected} chunks")]
    CountMismatch { expected: usize, actual: usize },

    #[error("build task failed: {0}")]
    Join(String),
}

/// Why a question could not be answered from the corpus.
///
/// The responder never surfaces these to callers directly; they are logged
/// and folded into [`Answer::ProviderError`](crate::Answer::ProviderError).
#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("index load failed: {0}")]
    Index(#[from] IndexError),

    #[error("query embedding failed: {0}")]
    Embedding(#[from] SemanticError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerateError),

    #[error("index was built with {index_model} but queries are embedded with {query_model}")]
    ModelMismatch {
        index_model: String,
        query_model: String,
    },

    #[error("retrieval task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for BuildError {
    fn from(err: tokio::task::JoinError) -> Self {
        BuildError::Join(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ResponderError {
    fn from(err: tokio::task::JoinError) -> Self {
        ResponderError::Join(err.to_string())
    }
}
