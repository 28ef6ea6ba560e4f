//! # docqa index
//!
//! Persistence and similarity search for chunk embeddings.
//!
//! The indexer produces one [`Snapshot`] per build: every chunk's text and
//! vector plus the id of the embedding model that made them. [`IndexStore`]
//! writes it atomically to `<dir>/index.snapshot`; the presence of that file
//! is the readiness marker the query side checks. Loading a snapshot yields a
//! [`VectorIndex`] that answers k-nearest-neighbour queries by cosine
//! similarity, exactly for small sets and through an HNSW graph for large ones.
//!
//! ## Storage format
//!
//! The snapshot is serialized with bincode and compressed with zstd. A schema
//! version is stored inside; snapshots from another version are rejected so
//! the next build can replace them.
//!
//! ## Example Usage
//!
//! ```
//! use index::{IndexConfig, IndexStore, Snapshot, SnapshotEntry};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let store = IndexStore::new(&IndexConfig {
//!     dir: dir.path().join("vector_index"),
//!     ..IndexConfig::default()
//! });
//! assert!(!store.is_ready());
//!
//! let snapshot = Snapshot::new(
//!     "stub-bow-2",
//!     vec![
//!         SnapshotEntry { text: "Admission opens in June.".into(), vector: vec![1.0, 0.0] },
//!         SnapshotEntry { text: "Fees are 10000.".into(), vector: vec![0.0, 1.0] },
//!     ],
//! )
//! .unwrap();
//! store.save(&snapshot).unwrap();
//! assert!(store.is_ready());
//!
//! let index = store.load().unwrap();
//! let hits = index.search(&[0.9, 0.1], 1).unwrap();
//! assert_eq!(hits[0].text, "Admission opens in June.");
//! ```
mod ann;
mod error;
mod snapshot;
mod store;
mod vector;

pub use ann::{AnnConfig, AnnIndex, AnnResult};
pub use error::IndexError;
pub use snapshot::{Snapshot, SnapshotEntry, SnapshotHeader, SNAPSHOT_SCHEMA_VERSION};
pub use store::{IndexCache, IndexConfig, IndexStore, SaveReport, SNAPSHOT_FILE};
pub use vector::{SearchHit, VectorIndex};
