//! Configuration types for corpus loading and chunking.
//!
//! Both types are cheap to clone and deserialize from any serde format, so the
//! server can embed them in its own configuration tree.
//!
//! ```rust
//! use ingest::{ChunkingConfig, CorpusConfig};
//!
//! let corpus = CorpusConfig::default();
//! assert_eq!(corpus.extensions, vec!["pdf".to_string(), "txt".to_string()]);
//!
//! let chunking = ChunkingConfig::default();
//! chunking.validate().expect("defaults are valid");
//! ```
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ChunkingError;

/// Where the corpus lives and which files belong to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorpusConfig {
    /// Directory holding the source documents. Only its direct children are read.
    pub source_dir: PathBuf,

    /// File extensions (without the dot, case-insensitive) that count as documents.
    pub extensions: Vec<String>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("./pdfs"),
            extensions: vec!["pdf".into(), "txt".into()],
        }
    }
}

impl CorpusConfig {
    /// Whether `ext` is one of the configured document extensions.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Chunk size bound and overlap, both measured in characters.
///
/// Defaults: 10 000 character chunks with 1 000 characters of overlap.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Hard upper bound on the number of characters in a chunk.
    pub chunk_size: usize,

    /// Minimum number of characters shared by two consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10_000,
            chunk_overlap: 1_000,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Checks that the window can always advance.
    ///
    /// The splitter needs at least two characters of headroom between the
    /// overlap and the size bound.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.chunk_size == 0 {
            return Err(ChunkingError::ZeroChunkSize);
        }
        if self.chunk_overlap + 2 > self.chunk_size {
            return Err(ChunkingError::OverlapTooLarge {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }
}
