//! Approximate nearest-neighbour search using HNSW, with an exact fallback.
//!
//! Small corpora (the common case: a handful of PDFs cut into 10k-character
//! chunks) are searched with an exact linear scan. HNSW kicks in once the
//! number of vectors reaches [`AnnConfig::min_vectors_for_ann`].
//!
//! ## Trade-offs
//!
//! - **Speed**: sub-linear search on large sets
//! - **Recall**: typically 95-99%, so a few true neighbours may be missed
//! - **Build time**: the graph is built when a snapshot is loaded

use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Configuration for ANN index construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnConfig {
    /// Number of neighbors per node (higher = better recall, slower build).
    pub m: usize,
    /// Size of the candidate list during construction.
    pub ef_construction: usize,
    /// Size of the candidate list during search. Raised to `k` when smaller.
    pub ef_search: usize,
    /// Whether to use ANN at all.
    pub enabled: bool,
    /// Below this many vectors, linear scan is used even if enabled.
    pub min_vectors_for_ann: usize,
}

impl Default for AnnConfig {
    fn default() -> Self {
        Self {
            m: 16,
            ef_construction: 200,
            ef_search: 50,
            enabled: true,
            min_vectors_for_ann: 1000,
        }
    }
}

impl AnnConfig {
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self
    }

    pub fn with_ef_search(mut self, ef: usize) -> Self {
        self.ef_search = ef;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_vectors_for_ann(mut self, min: usize) -> Self {
        self.min_vectors_for_ann = min;
        self
    }

    /// Check if ANN should be used given the current dataset size.
    pub fn should_use_ann(&self, num_vectors: usize) -> bool {
        self.enabled && num_vectors >= self.min_vectors_for_ann
    }
}

/// One neighbour: position of the vector in insertion order and its cosine distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnResult {
    pub index: usize,
    /// `1 - cosine similarity`; lower is closer.
    pub distance: f32,
}

/// Vectors in insertion order plus an optional HNSW graph over them.
pub struct AnnIndex {
    config: AnnConfig,
    dimension: usize,
    hnsw: Option<Hnsw<'static, f32, DistCosine>>,
    vectors: Vec<Vec<f32>>,
    built: bool,
}

impl AnnIndex {
    pub fn new(dimension: usize, config: AnnConfig) -> Self {
        Self {
            config,
            dimension,
            hnsw: None,
            vectors: Vec::new(),
            built: false,
        }
    }

    /// Appends a vector; its position is the next insertion index.
    pub fn insert(&mut self, vector: Vec<f32>) -> Result<usize, IndexError> {
        if vector.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: vector.len(),
            });
        }
        self.vectors.push(vector);
        self.built = false;
        Ok(self.vectors.len() - 1)
    }

    /// The `k` nearest vectors to `query`, closest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<AnnResult>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }
        if k == 0 || self.vectors.is_empty() {
            return Ok(Vec::new());
        }

        match &self.hnsw {
            Some(hnsw) if self.built && self.config.should_use_ann(self.vectors.len()) => {
                let ef = self.config.ef_search.max(k);
                Ok(hnsw
                    .search(query, k, ef)
                    .into_iter()
                    .map(|neighbour| AnnResult {
                        index: neighbour.get_origin_id(),
                        distance: neighbour.distance,
                    })
                    .collect())
            }
            _ => Ok(self.linear_search(query, k)),
        }
    }

    /// Exact scan. Ties keep insertion order so results are deterministic.
    fn linear_search(&self, query: &[f32], k: usize) -> Vec<AnnResult> {
        let mut distances: Vec<AnnResult> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(index, vec)| AnnResult {
                index,
                distance: cosine_distance(query, vec),
            })
            .collect();

        distances.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        distances.truncate(k);
        distances
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Builds the HNSW graph when the configuration calls for it.
    pub fn build(&mut self) {
        self.built = true;
        let nb_elem = self.vectors.len();
        // HNSW needs a minimum population to be useful; linear scan covers the rest.
        if nb_elem < 10 || !self.config.should_use_ann(nb_elem) {
            self.hnsw = None;
            return;
        }

        let nb_layer = 16.min((nb_elem as f32).ln().trunc() as usize).max(1);
        let hnsw = Hnsw::<f32, DistCosine>::new(
            self.config.m,
            nb_elem,
            nb_layer,
            self.config.ef_construction,
            DistCosine {},
        );
        let data_for_insertion: Vec<(&Vec<f32>, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(idx, vec)| (vec, idx))
            .collect();
        hnsw.parallel_insert(&data_for_insertion);

        log::debug!("hnsw graph built over {nb_elem} vectors ({nb_layer} layers)");
        self.hnsw = Some(hnsw);
    }

    pub fn config(&self) -> &AnnConfig {
        &self.config
    }
}

/// `1 - cosine similarity`. Zero vectors are maximally distant from everything.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    1.0 - (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
