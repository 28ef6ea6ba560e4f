//! Error types produced by the ingest crate.
//!
//! | Error | Raised by | Meaning |
//! |-------|-----------|---------|
//! | [`IngestError::SourceMissing`] | [`load_corpus`](crate::load_corpus) | the corpus directory does not exist |
//! | [`IngestError::NoDocuments`] | [`load_corpus`](crate::load_corpus) | no file matched the extension filter |
//! | [`IngestError::Io`] | [`load_corpus`](crate::load_corpus) | the directory itself could not be listed |
//! | [`ExtractError`] | [`TextExtractor`](crate::TextExtractor) | one document could not be read |
//! | [`ChunkingError`] | [`split_text`](crate::split_text) | chunking parameters are unusable |
//!
//! Callers treat every [`IngestError`] as a warning: the corpus is simply absent.
use std::path::PathBuf;

use thiserror::Error;

/// Corpus-level failures. None of these are fatal to the service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    #[error("source directory {0} does not exist")]
    SourceMissing(PathBuf),

    #[error("source path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("no documents with extensions [{extensions}] found in {dir}")]
    NoDocuments { dir: PathBuf, extensions: String },

    #[error("failed to list {dir}: {message}")]
    Io { dir: PathBuf, message: String },
}

/// Failure to extract text from a single document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExtractError {
    #[error("failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to parse PDF {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("no extractor registered for {0}")]
    Unsupported(PathBuf),

    /// The extractor panicked, typically on a malformed file.
    #[error("extractor panicked on {path}: {message}")]
    Panicked { path: PathBuf, message: String },
}

/// Invalid chunking parameters.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    #[error("chunk_overlap {chunk_overlap} leaves no room to advance within chunk_size {chunk_size}")]
    OverlapTooLarge {
        chunk_size: usize,
        chunk_overlap: usize,
    },
}
