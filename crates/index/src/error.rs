use std::path::PathBuf;

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IndexError {
    /// No snapshot has been written yet.
    #[error("no index snapshot at {0}")]
    NotFound(PathBuf),
    #[error("io error on {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("snapshot encode error: {0}")]
    Encode(String),
    #[error("snapshot decode error: {0}")]
    Decode(String),
    #[error("compression error: {0}")]
    Compression(String),
    #[error("snapshot schema version {found} is not supported (expected {expected})")]
    SchemaMismatch { found: u16, expected: u16 },
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("refusing to build an index with no entries")]
    Empty,
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            return IndexError::NotFound(path);
        }
        IndexError::Io {
            path,
            message: err.to_string(),
        }
    }
}
