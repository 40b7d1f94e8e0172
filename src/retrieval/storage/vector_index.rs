//! Read-only approximate nearest-neighbor index over the corpus embeddings.
//!
//! Backed by a usearch HNSW graph using squared Euclidean distance. Keys are
//! corpus positions: key `i` is the embedding of record `i`.

use std::path::Path;

use parking_lot::Mutex;
use tracing::info;
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::retrieval::core::errors::{
    RetrievalError, RetrievalResult, StartupError, StartupResult,
};

/// One nearest-neighbor hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Corpus position of the hit.
    pub position: usize,
    /// Squared L2 distance to the query.
    pub distance: f32,
}

/// HNSW index loaded once at startup and only ever searched afterwards.
///
/// usearch serves searches from a fixed pool of thread slots and fails any
/// search that finds the pool exhausted, so searches are serialized.
pub struct VectorIndex {
    index: Mutex<Index>,
    dimension: usize,
    len: usize,
}

fn index_options(dimension: usize) -> IndexOptions {
    IndexOptions {
        dimensions: dimension,
        metric: MetricKind::L2sq,
        quantization: ScalarKind::F32,
        ..Default::default()
    }
}

fn index_error(path: &Path, message: impl Into<String>) -> StartupError {
    StartupError::Index {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

impl VectorIndex {
    /// Load a serialized index built with squared-L2 over `dimension`-wide vectors.
    ///
    /// # Errors
    /// Returns an error if the file is missing, unreadable, or has another dimension.
    pub fn load(path: &Path, dimension: usize) -> StartupResult<Self> {
        if !path.is_file() {
            return Err(index_error(path, "index file not found"));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| index_error(path, "index path is not valid UTF-8"))?;

        let index = Index::new(&index_options(dimension))
            .map_err(|e| index_error(path, format!("usearch init failed: {e}")))?;
        index
            .load(path_str)
            .map_err(|e| index_error(path, format!("usearch load failed: {e}")))?;

        if index.dimensions() != dimension {
            return Err(index_error(
                path,
                format!(
                    "index dimension {} does not match configured {dimension}",
                    index.dimensions()
                ),
            ));
        }

        let len = index.size();
        info!(path = %path.display(), vectors = len, dimension, "vector index loaded");
        Ok(Self {
            index: Mutex::new(index),
            dimension,
            len,
        })
    }

    /// Build an in-memory index where vector `i` gets key `i`.
    ///
    /// Meant for fixtures; production indexes are built offline.
    ///
    /// # Errors
    /// Returns an error if a vector has the wrong dimension or usearch rejects it.
    pub fn from_vectors(vectors: &[Vec<f32>], dimension: usize) -> StartupResult<Self> {
        let build_error = |message: String| StartupError::Index {
            path: "<memory>".into(),
            message,
        };

        let index = Index::new(&index_options(dimension))
            .map_err(|e| build_error(format!("usearch init failed: {e}")))?;
        index
            .reserve(vectors.len().max(1))
            .map_err(|e| build_error(format!("usearch reserve failed: {e}")))?;

        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(build_error(format!(
                    "vector {position} has dimension {}, expected {dimension}",
                    vector.len()
                )));
            }
            index
                .add(position as u64, vector.as_slice())
                .map_err(|e| build_error(format!("usearch add failed: {e}")))?;
        }

        Ok(Self {
            index: Mutex::new(index),
            dimension,
            len: vectors.len(),
        })
    }

    /// Serialize the index to `path`.
    ///
    /// # Errors
    /// Returns an error if the path is not UTF-8 or usearch cannot write it.
    pub fn save(&self, path: &Path) -> StartupResult<()> {
        let path_str = path
            .to_str()
            .ok_or_else(|| index_error(path, "index path is not valid UTF-8"))?;
        self.index
            .lock()
            .save(path_str)
            .map_err(|e| index_error(path, format!("usearch save failed: {e}")))
    }

    /// Find the `k` nearest positions, nearest first.
    ///
    /// `k` is clamped to the number of indexed vectors.
    ///
    /// # Errors
    /// Returns an error for a zero `k`, an empty index, a query of the wrong
    /// dimension, or a search that yields an out-of-range key.
    pub fn search(&self, query: &[f32], k: usize) -> RetrievalResult<Vec<Neighbor>> {
        if k == 0 {
            return Err(RetrievalError::InvalidK(k));
        }
        if self.len == 0 {
            return Err(RetrievalError::EmptyCorpus);
        }
        if query.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let k = k.min(self.len);
        let matches = self
            .index
            .lock()
            .search(query, k)
            .map_err(|e| RetrievalError::Search(e.to_string()))?;

        let mut neighbors = matches
            .keys
            .iter()
            .zip(&matches.distances)
            .map(|(key, distance)| {
                usize::try_from(*key)
                    .ok()
                    .filter(|position| *position < self.len)
                    .map(|position| Neighbor {
                        position,
                        distance: *distance,
                    })
                    .ok_or_else(|| {
                        RetrievalError::Search(format!("index returned invalid key {key}"))
                    })
            })
            .collect::<RetrievalResult<Vec<_>>>()?;

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(neighbors)
    }

    /// Whether a vector is stored under `position`.
    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        self.index.lock().contains(position as u64)
    }

    /// Number of indexed vectors.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no vectors.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Vector width.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }
}
