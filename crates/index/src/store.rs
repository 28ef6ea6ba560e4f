use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::ann::AnnConfig;
use crate::error::IndexError;
use crate::snapshot::{Snapshot, SnapshotHeader};
use crate::vector::VectorIndex;

/// File name of the snapshot inside the index directory. Its existence is the
/// readiness marker.
pub const SNAPSHOT_FILE: &str = "index.snapshot";

/// Where the index lives and how it is written and searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: PathBuf,
    /// zstd level for the snapshot file (1-22).
    pub compression_level: i32,
    pub ann: AnnConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./vector_index"),
            compression_level: 3,
            ann: AnnConfig::default(),
        }
    }
}

/// Reads and writes the single snapshot file.
///
/// Saves go to a temporary file in the same directory and are renamed into
/// place, so readers only ever see a complete snapshot or none.
#[derive(Debug, Clone)]
pub struct IndexStore {
    dir: PathBuf,
    compression_level: i32,
    ann: AnnConfig,
}

/// What a successful save wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub path: PathBuf,
    pub bytes: u64,
    pub entries: usize,
}

impl IndexStore {
    pub fn new(config: &IndexConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            compression_level: config.compression_level,
            ann: config.ann,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }

    /// Whether a snapshot has been committed.
    pub fn is_ready(&self) -> bool {
        self.snapshot_path().is_file()
    }

    /// Atomically replaces the current snapshot. Creates the directory if needed.
    pub fn save(&self, snapshot: &Snapshot) -> Result<SaveReport, IndexError> {
        let bytes = snapshot.encode(self.compression_level)?;
        fs::create_dir_all(&self.dir).map_err(|e| IndexError::io(&self.dir, e))?;

        let path = self.snapshot_path();
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| IndexError::io(&self.dir, e))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| IndexError::io(tmp.path(), e))?;
        tmp.persist(&path)
            .map_err(|e| IndexError::io(&path, e.error))?;

        log::info!(
            "index snapshot written to {} ({} entries, {} bytes)",
            path.display(),
            snapshot.len(),
            bytes.len()
        );
        Ok(SaveReport {
            path,
            bytes: bytes.len() as u64,
            entries: snapshot.len(),
        })
    }

    pub fn load_snapshot(&self) -> Result<Snapshot, IndexError> {
        let path = self.snapshot_path();
        let bytes = fs::read(&path).map_err(|e| IndexError::io(&path, e))?;
        Snapshot::decode(&bytes)
    }

    /// Reads the committed snapshot's header without decoding its entries.
    pub fn load_header(&self) -> Result<SnapshotHeader, IndexError> {
        let path = self.snapshot_path();
        let file = File::open(&path).map_err(|e| IndexError::io(&path, e))?;
        Snapshot::read_header(BufReader::new(file))
    }

    /// Loads the snapshot and builds a searchable index over it.
    pub fn load(&self) -> Result<VectorIndex, IndexError> {
        VectorIndex::from_snapshot(self.load_snapshot()?, self.ann)
    }
}

/// Keeps the most recently loaded [`VectorIndex`] and rebuilds it only when a
/// snapshot with a different build id has been committed.
///
/// Each lookup reads the snapshot header, so a rebuild is picked up by the
/// next call. Blocking; call from a blocking thread.
#[derive(Clone)]
pub struct IndexCache {
    store: IndexStore,
    current: Arc<Mutex<Option<Arc<VectorIndex>>>>,
}

impl IndexCache {
    pub fn new(store: IndexStore) -> Self {
        Self {
            store,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// The index for the committed snapshot.
    pub fn load(&self) -> Result<Arc<VectorIndex>, IndexError> {
        let header = self.store.load_header()?;
        if let Some(index) = self.cached(header.build_id) {
            return Ok(index);
        }

        let index = Arc::new(self.store.load()?);
        log::debug!(
            "loaded index build {} ({} entries)",
            index.build_id(),
            index.len()
        );
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = Some(Arc::clone(&index));
        Ok(index)
    }

    fn cached(&self, build_id: u64) -> Option<Arc<VectorIndex>> {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current
            .as_ref()
            .filter(|index| index.build_id() == build_id)
            .map(Arc::clone)
    }
}
