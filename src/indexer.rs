//! Corpus → chunks → embeddings → snapshot.
use std::path::PathBuf;
use std::time::{Duration, Instant};

use index::{IndexStore, Snapshot, SnapshotEntry};
use ingest::{load_corpus, split_text, ExtractorRegistry, IngestError, SkippedDocument};
use semantic::Embedder;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::BuildError;

/// Result of a build that did not fail.
#[derive(Debug)]
pub enum IndexBuildResult {
    /// A new snapshot was committed.
    Built(BuildReport),
    /// Nothing was written. Any previous snapshot is untouched.
    Skipped(SkipReason),
}

impl IndexBuildResult {
    pub fn is_built(&self) -> bool {
        matches!(self, IndexBuildResult::Built(_))
    }
}

#[derive(Debug)]
pub enum SkipReason {
    /// The corpus directory is missing, unreadable or has no matching files.
    Ingest(IngestError),
    /// Documents were found but none produced any text.
    NoText { skipped: Vec<SkippedDocument> },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Ingest(err) => write!(f, "{err}"),
            SkipReason::NoText { skipped } => write!(
                f,
                "no extractable text in the corpus ({} documents failed)",
                skipped.len()
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub documents: usize,
    pub skipped: Vec<SkippedDocument>,
    pub chunks: usize,
    pub dimension: usize,
    pub embedding_model: String,
    pub snapshot_path: PathBuf,
    pub snapshot_bytes: u64,
    pub elapsed: Duration,
}

/// Builds the vector index from the corpus directory and commits it.
///
/// Reading, chunking and writing run on the blocking pool. Embedding goes
/// through `embedder`, whose [`Embedder::model_id`] is recorded in the
/// snapshot so the responder can refuse to mix models.
///
/// Running this twice over an unchanged corpus with a deterministic embedder
/// produces the same entries; the second commit replaces the first.
pub async fn build_index(
    cfg: &PipelineConfig,
    embedder: &dyn Embedder,
) -> Result<IndexBuildResult, BuildError> {
    let start = Instant::now();

    let corpus_cfg = cfg.corpus.clone();
    let chunking = cfg.chunking;
    let prepared = tokio::task::spawn_blocking(move || {
        let corpus = match load_corpus(&corpus_cfg, &ExtractorRegistry::default()) {
            Ok(corpus) => corpus,
            Err(err) => return Ok(Err(SkipReason::Ingest(err))),
        };
        if corpus.is_empty() {
            return Ok(Err(SkipReason::NoText {
                skipped: corpus.skipped,
            }));
        }
        let chunks = split_text(&corpus.concatenated_text(), &chunking)?;
        Ok::<_, BuildError>(Ok((corpus.documents.len(), corpus.skipped, chunks)))
    })
    .await??;

    let (documents, skipped, chunks) = match prepared {
        Ok(prepared) => prepared,
        Err(reason) => {
            warn!(reason = %reason, "index_build_skipped");
            return Ok(IndexBuildResult::Skipped(reason));
        }
    };

    let texts: Vec<String> = chunks.into_iter().map(|chunk| chunk.text).collect();
    info!(
        documents,
        skipped = skipped.len(),
        chunks = texts.len(),
        model = embedder.model_id(),
        "embedding_chunks"
    );

    let vectors = embedder.embed_documents(&texts).await?;
    if vectors.len() != texts.len() {
        return Err(BuildError::CountMismatch {
            expected: texts.len(),
            actual: vectors.len(),
        });
    }

    let entries = texts
        .into_iter()
        .zip(vectors)
        .map(|(text, vector)| SnapshotEntry { text, vector })
        .collect();
    let snapshot = Snapshot::new(embedder.model_id(), entries)?;
    let dimension = snapshot.dimension;
    let chunk_count = snapshot.len();

    let store = IndexStore::new(&cfg.index);
    let saved = tokio::task::spawn_blocking(move || store.save(&snapshot)).await??;

    let report = BuildReport {
        documents,
        skipped,
        chunks: chunk_count,
        dimension,
        embedding_model: embedder.model_id().to_string(),
        snapshot_path: saved.path,
        snapshot_bytes: saved.bytes,
        elapsed: start.elapsed(),
    };
    info!(
        chunks = report.chunks,
        dimension = report.dimension,
        bytes = report.snapshot_bytes,
        path = %report.snapshot_path.display(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "index_built"
    );
    Ok(IndexBuildResult::Built(report))
}
