//! Corpus ingestion for docqa.
//!
//! This is where documents enter the pipeline. We list the corpus directory,
//! pull the text out of each document, and cut the combined text into
//! overlapping chunks that the embedding stage can handle.
//!
//! ## What we do here
//!
//! - **List documents** - Only files directly inside the corpus directory whose
//!   extension is on the allow-list. Listing is sorted so builds are repeatable.
//! - **Extract text** - PDFs via `lopdf` (behind the `pdf` feature), plain text
//!   as lossy UTF-8. A document that fails to extract is skipped with a warning.
//! - **Chunk** - Size-bounded windows that share a configurable overlap and end
//!   on paragraph, line, sentence or word boundaries where possible.
//!
//! ## Example
//!
//! ```
//! use ingest::{split_text, ChunkingConfig};
//!
//! let cfg = ChunkingConfig::new(40, 8);
//! let text = "Admission opens in June. The fee is 10000 per year. Hostel is optional.";
//! let chunks = split_text(text, &cfg).unwrap();
//!
//! assert!(chunks.len() > 1);
//! assert!(chunks.iter().all(|c| c.char_len() <= 40));
//! ```
mod chunk;
mod config;
mod corpus;
mod error;
mod extract;
mod types;

pub use crate::chunk::split_text;
pub use crate::config::{ChunkingConfig, CorpusConfig};
pub use crate::corpus::{list_documents, load_corpus};
pub use crate::error::{ChunkingError, ExtractError, IngestError};
#[cfg(feature = "pdf")]
pub use crate::extract::PdfExtractor;
pub use crate::extract::{ExtractorRegistry, PlainTextExtractor, TextExtractor};
pub use crate::types::{Chunk, Corpus, CorpusDocument, SkippedDocument};
