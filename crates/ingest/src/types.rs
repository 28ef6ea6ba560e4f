use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// One source file and the text extracted from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub path: PathBuf,
    /// Extracted text; empty when the file had no extractable text.
    pub text: String,
}

/// A document that was listed but could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub error: ExtractError,
}

/// Everything read from the corpus directory in one pass.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<CorpusDocument>,
    pub skipped: Vec<SkippedDocument>,
}

impl Corpus {
    /// Joins the text of every document into a single stream.
    ///
    /// Documents are separated by a blank line so the chunker can treat the
    /// boundary as a paragraph break. Documents with no text contribute nothing.
    pub fn concatenated_text(&self) -> String {
        let mut out = String::new();
        for doc in &self.documents {
            let text = doc.text.trim();
            if text.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(text);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.documents.iter().all(|doc| doc.text.trim().is_empty())
    }
}

/// A bounded, overlapping slice of the corpus text. The unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of the chunk in the stream, starting at zero.
    pub ordinal: usize,
    /// Character offset of the first character in the concatenated text.
    pub char_start: usize,
    pub text: String,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
