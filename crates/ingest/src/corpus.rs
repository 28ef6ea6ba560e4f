use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::CorpusConfig;
use crate::error::IngestError;
use crate::extract::ExtractorRegistry;
use crate::types::{Corpus, CorpusDocument, SkippedDocument};

/// Lists the documents directly inside `cfg.source_dir` that match the
/// extension filter, sorted by file name.
pub fn list_documents(cfg: &CorpusConfig) -> Result<Vec<PathBuf>, IngestError> {
    let dir = &cfg.source_dir;
    if !dir.exists() {
        return Err(IngestError::SourceMissing(dir.clone()));
    }
    if !dir.is_dir() {
        return Err(IngestError::NotADirectory(dir.clone()));
    }

    let mut paths = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(IngestError::Io {
                    dir: dir.clone(),
                    message: err.to_string(),
                });
            }
            Err(err) => {
                debug!(error = %err, "corpus_entry_unreadable");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| cfg.accepts_extension(ext));
        if matches {
            paths.push(entry.into_path());
        }
    }

    if paths.is_empty() {
        return Err(IngestError::NoDocuments {
            dir: dir.clone(),
            extensions: cfg.extensions.join(", "),
        });
    }
    Ok(paths)
}

/// Reads and extracts every document in the corpus directory.
///
/// A document whose extraction fails is recorded in [`Corpus::skipped`] and
/// the rest are still read. Only directory-level problems return an error.
pub fn load_corpus(
    cfg: &CorpusConfig,
    extractors: &ExtractorRegistry,
) -> Result<Corpus, IngestError> {
    let start = Instant::now();
    let paths = list_documents(cfg)?;

    let mut corpus = Corpus::default();
    for path in paths {
        match extractors.extract(&path) {
            Ok(text) => {
                if text.trim().is_empty() {
                    warn!(path = %path.display(), "document_has_no_text");
                } else {
                    debug!(path = %path.display(), chars = text.chars().count(), "document_extracted");
                }
                corpus.documents.push(CorpusDocument { path, text });
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "document_skipped");
                corpus.skipped.push(SkippedDocument { path, error });
            }
        }
    }

    info!(
        dir = %cfg.source_dir.display(),
        documents = corpus.documents.len(),
        skipped = corpus.skipped.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "corpus_loaded"
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn cfg_for(dir: &std::path::Path) -> CorpusConfig {
        CorpusConfig {
            source_dir: dir.to_path_buf(),
            ..CorpusConfig::default()
        }
    }

    #[test]
    fn missing_directory_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = cfg_for(&tmp.path().join("nope"));
        assert!(matches!(
            load_corpus(&cfg, &ExtractorRegistry::default()),
            Err(IngestError::SourceMissing(_))
        ));
    }

    #[test]
    fn file_instead_of_directory_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("pdfs");
        fs::write(&file, "x").unwrap();
        assert!(matches!(
            list_documents(&cfg_for(&file)),
            Err(IngestError::NotADirectory(_))
        ));
    }

    #[test]
    fn directory_without_matching_files_has_no_documents() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("image.png"), [0u8, 1, 2]).unwrap();
        assert!(matches!(
            list_documents(&cfg_for(tmp.path())),
            Err(IngestError::NoDocuments { .. })
        ));
    }

    #[test]
    fn listing_is_sorted_and_non_recursive() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        fs::write(tmp.path().join("a.TXT"), "a").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested").join("c.txt"), "c").unwrap();

        let paths = list_documents(&cfg_for(tmp.path())).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.TXT", "b.txt"]);
    }

    #[test]
    fn failed_extraction_is_skipped_not_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("good.txt"), "Fees are 10000.").unwrap();
        fs::write(tmp.path().join("broken.pdf"), "not a pdf at all").unwrap();

        let corpus = load_corpus(&cfg_for(tmp.path()), &ExtractorRegistry::default()).unwrap();
        assert_eq!(corpus.documents.len(), 1);
        assert_eq!(corpus.skipped.len(), 1);
        assert!(corpus.skipped[0].path.ends_with("broken.pdf"));
        assert_eq!(corpus.concatenated_text(), "Fees are 10000.");
    }

    struct ExplodingExtractor;

    impl crate::extract::TextExtractor for ExplodingExtractor {
        fn extract(&self, _path: &std::path::Path) -> Result<String, crate::error::ExtractError> {
            panic!("malformed xref table")
        }
    }

    #[test]
    fn panicking_extractor_skips_only_that_document() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.pdf"), "%PDF-1.7 truncated").unwrap();
        fs::write(tmp.path().join("b.txt"), "Admission opens in June.").unwrap();
        let extractors = ExtractorRegistry::empty()
            .with("pdf", Box::new(ExplodingExtractor))
            .with("txt", Box::new(crate::extract::PlainTextExtractor));

        let corpus = load_corpus(&cfg_for(tmp.path()), &extractors).unwrap();
        assert_eq!(corpus.documents.len(), 1);
        assert_eq!(corpus.skipped.len(), 1);
        assert!(matches!(
            &corpus.skipped[0].error,
            crate::error::ExtractError::Panicked { message, .. } if message == "malformed xref table"
        ));
    }
}
