//! Flat in-memory vector index with exact inner-product search.
//!
//! Vectors are stored row-major in one contiguous buffer. Position `i` in the
//! index is record `i` in the corpus, so the index has no ids of its own.
//! Inputs are expected to be unit-normalized, which makes the inner product
//! the cosine similarity.

use std::cmp::Ordering;

/// Exhaustive inner-product index.
///
/// Built once with [`FlatIndex::build`] and read-only afterwards.
pub struct FlatIndex {
    /// Row-major vectors, `len * dimensions` floats
    data: Vec<f32>,
    dimensions: usize,
    len: usize,
    built: bool,
}

/// A raw match from the index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    /// Inner product with the query
    pub score: f32,
    /// Row in the index (and the corpus)
    pub position: usize,
}

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("index already built, reset it first")]
    AlreadyBuilt,
}

impl FlatIndex {
    /// Create a new empty index for vectors of `dimensions` floats.
    pub fn new(dimensions: usize) -> Self {
        Self {
            data: Vec::new(),
            dimensions,
            len: 0,
            built: false,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bulk load every vector. Row order is preserved.
    ///
    /// Fails without modifying the index if any row has the wrong width or if
    /// the index was already built.
    pub fn build(&mut self, embeddings: Vec<Vec<f32>>) -> Result<(), IndexError> {
        if self.built {
            return Err(IndexError::AlreadyBuilt);
        }

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: bad.len(),
            });
        }

        let mut data = Vec::with_capacity(embeddings.len() * self.dimensions);
        for embedding in &embeddings {
            data.extend_from_slice(embedding);
        }

        self.data = data;
        self.len = embeddings.len();
        self.built = true;

        Ok(())
    }

    /// Drop all vectors so the index can be built again.
    pub fn reset(&mut self) {
        self.data.clear();
        self.len = 0;
        self.built = false;
    }

    /// Score `query` against every stored vector and return the best `k`.
    ///
    /// Results are sorted by descending score, ties by ascending position.
    /// At most `min(k, len)` hits are returned, all with `position < len`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if self.is_empty() || k == 0 {
            return Ok(vec![]);
        }

        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .rows()
            .enumerate()
            .map(|(position, row)| SearchHit {
                score: dot(query, row),
                position,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.position.cmp(&b.position))
        });
        hits.truncate(k);

        debug_assert!(hits.iter().all(|hit| hit.position < self.len));

        Ok(hits)
    }

    fn rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.dimensions.max(1)).take(self.len)
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
