//! The persisted form of a vector index.
//!
//! A snapshot is one bincode-encoded [`Snapshot`] compressed with zstd. It is
//! written once per build and never modified afterwards.
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};

use bincode::config::standard;
use bincode::serde::{decode_from_slice, decode_from_std_read, encode_to_vec};
use serde::{Deserialize, Serialize};
use zstd::stream::read::Decoder;
use zstd::{decode_all, encode_all};

use crate::error::IndexError;

/// Bump this value whenever the on-disk snapshot layout changes.
pub const SNAPSHOT_SCHEMA_VERSION: u16 = 2;

/// One chunk: its text and embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub text: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u16,
    /// Id of the embedder that produced the vectors (see `Embedder::model_id`).
    pub embedding_model: String,
    pub dimension: usize,
    /// Seconds since the Unix epoch when the build finished.
    pub created_at: u64,
    /// Unique per build within a process and increasing over time.
    pub build_id: u64,
    pub entries: Vec<SnapshotEntry>,
}

/// The fields that precede the entries. Decodable without reading the
/// vectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub schema_version: u16,
    pub embedding_model: String,
    pub dimension: usize,
    pub created_at: u64,
    pub build_id: u64,
}

static LAST_BUILD_ID: AtomicU64 = AtomicU64::new(0);

/// Nanoseconds since the epoch, bumped past the previous id when the clock
/// has not moved.
fn next_build_id() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let mut id = now;
    let _ = LAST_BUILD_ID.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        id = now.max(last + 1);
        Some(id)
    });
    id
}

impl Snapshot {
    /// Assembles a snapshot, checking every vector has the same width.
    pub fn new(
        embedding_model: impl Into<String>,
        entries: Vec<SnapshotEntry>,
    ) -> Result<Self, IndexError> {
        let first = entries.first().ok_or(IndexError::Empty)?;
        let dimension = first.vector.len();
        if dimension == 0 {
            return Err(IndexError::DimensionMismatch {
                expected: 1,
                got: 0,
            });
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != dimension) {
            return Err(IndexError::DimensionMismatch {
                expected: dimension,
                got: bad.vector.len(),
            });
        }
        let created_at = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Ok(Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            embedding_model: embedding_model.into(),
            dimension,
            created_at,
            build_id: next_build_id(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn encode(&self, level: i32) -> Result<Vec<u8>, IndexError> {
        let raw = encode_to_vec(self, standard())?;
        encode_all(raw.as_slice(), level).map_err(|e| IndexError::Compression(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, IndexError> {
        let raw = decode_all(bytes).map_err(|e| IndexError::Compression(e.to_string()))?;
        let (snapshot, _): (Snapshot, usize) = decode_from_slice(&raw, standard())?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(IndexError::SchemaMismatch {
                found: snapshot.schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        Ok(snapshot)
    }

    /// Decodes only the header from a compressed snapshot stream.
    pub fn read_header<R: Read>(reader: R) -> Result<SnapshotHeader, IndexError> {
        let mut decoder =
            Decoder::new(reader).map_err(|e| IndexError::Compression(e.to_string()))?;
        let schema_version: u16 = decode_from_std_read(&mut decoder, standard())?;
        if schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(IndexError::SchemaMismatch {
                found: schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        let (embedding_model, dimension, created_at, build_id): (String, usize, u64, u64) =
            decode_from_std_read(&mut decoder, standard())?;
        Ok(SnapshotHeader {
            schema_version,
            embedding_model,
            dimension,
            created_at,
            build_id,
        })
    }
}
