//! Text extraction from individual source files.
//!
//! Extraction sits behind the [`TextExtractor`] trait so the corpus loader does
//! not care whether a file is a PDF or plain text. [`ExtractorRegistry`] picks
//! an extractor by file extension.
use std::any::Any;
use std::collections::HashMap;
use std::fs;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use tracing::debug;

use crate::error::ExtractError;

/// Turns one file into text. Implementations must be stateless and thread-safe.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Reads UTF-8 text, replacing invalid sequences instead of failing.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = fs::read(path).map_err(|e| ExtractError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        match String::from_utf8(bytes) {
            Ok(text) => Ok(text),
            Err(err) => Ok(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        }
    }
}

/// Extracts the text layer of a PDF page by page.
///
/// Pages that fail to decode or carry no text are skipped; the remaining pages
/// are joined with newlines in page order. A PDF that cannot be opened at all
/// is an error.
#[cfg(feature = "pdf")]
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl TextExtractor for PdfExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let doc = lopdf::Document::load(path).map_err(|e| ExtractError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut text = String::new();
        // BTreeMap keys: already in page order.
        for page_number in doc.get_pages().into_keys() {
            match doc.extract_text(&[page_number]) {
                Ok(page_text) => {
                    let page_text = page_text.trim();
                    if page_text.is_empty() {
                        continue;
                    }
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(page_text);
                }
                Err(err) => {
                    debug!(path = %path.display(), page = page_number, error = %err, "pdf_page_skipped");
                }
            }
        }
        Ok(text)
    }
}

/// Extension → extractor lookup.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// An empty registry. Every file will be reported as unsupported.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registers `extractor` for `ext` (case-insensitive, no leading dot).
    pub fn with(mut self, ext: &str, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractors.insert(normalize_ext(ext), extractor);
        self
    }

    pub fn get(&self, ext: &str) -> Option<&dyn TextExtractor> {
        self.extractors.get(&normalize_ext(ext)).map(|e| e.as_ref())
    }

    /// Extracts `path` with the extractor registered for its extension.
    ///
    /// A panicking extractor is reported as [`ExtractError::Panicked`] so one
    /// malformed file cannot take the rest of the corpus down with it.
    pub fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let Some(extractor) = self.get(ext) else {
            return Err(ExtractError::Unsupported(path.to_path_buf()));
        };
        catch_unwind(AssertUnwindSafe(|| extractor.extract(path))).unwrap_or_else(|payload| {
            Err(ExtractError::Panicked {
                path: path.to_path_buf(),
                message: panic_message(payload.as_ref()),
            })
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic".to_string()
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let registry = Self::empty()
            .with("txt", Box::new(PlainTextExtractor))
            .with("md", Box::new(PlainTextExtractor));
        #[cfg(feature = "pdf")]
        let registry = registry.with("pdf", Box::new(PdfExtractor));
        registry
    }
}

fn normalize_ext(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}
