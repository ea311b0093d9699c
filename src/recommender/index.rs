//! In-memory embedding index with dot-product scoring.
//!
//! Stores one unit-normalized vector per catalog item, keyed by catalog
//! position, in a flat row-major matrix. Since every row and every query is
//! normalized up front, the dot product is the cosine similarity and no
//! norms are recomputed at query time.

use std::time::Instant;

use crate::catalog::CatalogItem;
use crate::recommender::encoder::TextEncoder;
use crate::recommender::error::RecommendError;
use crate::recommender::text::embeddable_text;

/// Guard added to the norm so zero vectors don't divide by zero
const NORM_EPSILON: f32 = 1e-12;

/// How far past [-1, 1] a score may drift from rounding before it is
/// treated as a broken vector instead of clamped
pub const SCORE_EPSILON: f32 = 1e-5;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Vector #{0} contains NaN or infinite values")]
    NonFinite(usize),

    #[error("Encoder returned zero-length vectors")]
    ZeroDimensions,

    #[error("Score {0} is outside [-1, 1]")]
    ScoreOutOfRange(f32),
}

/// Lifecycle of the index owned by a recommender.
///
/// Moves from `Empty` to `Built` once and never back.
#[derive(Debug, Default)]
pub enum IndexState {
    #[default]
    Empty,
    Built(EmbeddingIndex),
}

impl IndexState {
    pub fn is_built(&self) -> bool {
        matches!(self, IndexState::Built(_))
    }

    pub fn built(&self) -> Option<&EmbeddingIndex> {
        match self {
            IndexState::Built(index) => Some(index),
            IndexState::Empty => None,
        }
    }
}

/// Normalized embedding matrix, one row per catalog item.
#[derive(Debug, Clone)]
pub struct EmbeddingIndex {
    /// Row-major, `rows * dimensions` values
    vectors: Vec<f32>,
    dimensions: usize,
    rows: usize,
}

impl EmbeddingIndex {
    /// Embed every catalog item with a single batched encoder call.
    pub fn build(
        items: &[CatalogItem],
        encoder: &dyn TextEncoder,
    ) -> Result<Self, RecommendError> {
        if items.is_empty() {
            log::warn!("catalog is empty, nothing to embed");
            return Ok(Self {
                vectors: vec![],
                dimensions: 0,
                rows: 0,
            });
        }

        let started = Instant::now();
        let texts: Vec<String> = items.iter().map(embeddable_text).collect();
        let embeddings = encoder.encode(&texts)?;

        if embeddings.len() != items.len() {
            return Err(RecommendError::EncodingMismatch {
                expected: items.len(),
                got: embeddings.len(),
            });
        }

        let index = Self::from_vectors(embeddings)?;

        log::info!(
            "embedded {} catalog items with '{}' ({} dims) in {:?}",
            index.len(),
            encoder.model(),
            index.dimensions(),
            started.elapsed()
        );

        Ok(index)
    }

    /// Normalize and store raw vectors. All rows must share one length.
    pub fn from_vectors(embeddings: Vec<Vec<f32>>) -> Result<Self, IndexError> {
        let rows = embeddings.len();
        let dimensions = embeddings.first().map(Vec::len).unwrap_or(0);
        if rows > 0 && dimensions == 0 {
            return Err(IndexError::ZeroDimensions);
        }

        let mut vectors = Vec::with_capacity(rows * dimensions);
        for (row, mut embedding) in embeddings.into_iter().enumerate() {
            if embedding.len() != dimensions {
                return Err(IndexError::DimensionMismatch {
                    expected: dimensions,
                    got: embedding.len(),
                });
            }
            if !embedding.iter().all(|x| x.is_finite()) {
                return Err(IndexError::NonFinite(row));
            }

            normalize(&mut embedding);
            vectors.extend_from_slice(&embedding);
        }

        Ok(Self {
            vectors,
            dimensions,
            rows,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Normalized vector stored for the item at `position`.
    #[cfg(test)]
    pub fn row(&self, position: usize) -> Option<&[f32]> {
        if position >= self.rows {
            return None;
        }
        let start = position * self.dimensions;
        Some(&self.vectors[start..start + self.dimensions])
    }

    /// Score every row against an already normalized query vector.
    ///
    /// Returns one score per catalog position.
    pub fn scores(&self, query: &[f32]) -> Result<Vec<f32>, IndexError> {
        if self.rows == 0 {
            return Ok(vec![]);
        }
        if query.len() != self.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimensions,
                got: query.len(),
            });
        }

        self.vectors
            .chunks_exact(self.dimensions)
            .map(|row| bound_score(dot(row, query)))
            .collect()
    }
}

/// Scale a vector to unit length in place.
pub fn normalize(vector: &mut [f32]) {
    let denom = l2_norm(vector) + NORM_EPSILON;
    for x in vector.iter_mut() {
        *x /= denom;
    }
}

/// Compute L2 norm of a vector.
fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Clamp rounding drift back into [-1, 1]; reject anything further out.
fn bound_score(score: f32) -> Result<f32, IndexError> {
    if !score.is_finite() || score.abs() > 1.0 + SCORE_EPSILON {
        return Err(IndexError::ScoreOutOfRange(score));
    }
    Ok(score.clamp(-1.0, 1.0))
}
