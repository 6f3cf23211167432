//! Type-safe wrappers and core types for the vector layer.
//!
//! Chunk identities, vector dimensions and relevance scores are newtypes so
//! that a chunk position, a distance and a relevance can never be mixed up.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Vector dimension of the all-MiniLM-L6-v2 sentence-transformer.
pub const VECTOR_DIMENSION_384: usize = 384;

/// Position of a chunk in the flat chunk corpus (0..N-1).
///
/// This is the only identity the index knows about. Zero is a valid id,
/// so unlike most ids in this crate it wraps a plain integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(u32);

impl ChunkId {
    /// Creates a new `ChunkId`.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Creates a `ChunkId` from a corpus position.
    ///
    /// Returns `None` if the position does not fit in a `u32`.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Returns the underlying u32 value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the id as a corpus position.
    #[must_use]
    pub const fn as_index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ChunkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relevance of a retrieved chunk, derived from its distance to the query.
///
/// Always lies in (0.0, 1.0]: 1.0 means the chunk vector coincides with the
/// query vector, values approach 0.0 as the distance grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Relevance(f32);

impl Relevance {
    /// Converts a distance into a relevance using `1 / (1 + distance)`.
    ///
    /// Negative distances cannot come out of a metric and are clamped to zero.
    /// NaN and infinite distances are rejected.
    pub fn from_distance(distance: f32) -> Result<Self, VectorError> {
        if distance.is_nan() {
            return Err(VectorError::InvalidDistance {
                value: distance,
                reason: "Distance cannot be NaN",
            });
        }
        if distance.is_infinite() {
            return Err(VectorError::InvalidDistance {
                value: distance,
                reason: "Distance must be finite",
            });
        }
        Ok(Self(1.0 / (1.0 + distance.max(0.0))))
    }

    /// Relevance of an exact match.
    #[must_use]
    pub const fn exact() -> Self {
        Self(1.0)
    }

    /// Returns the underlying f32 value.
    #[must_use]
    pub fn get(&self) -> f32 {
        self.0
    }

    /// Whether this relevance clears `threshold`.
    #[must_use]
    pub fn meets(&self, threshold: f32) -> bool {
        self.0 >= threshold
    }
}

impl Eq for Relevance {}

impl PartialOrd for Relevance {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Relevance {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Type-safe wrapper for vector dimensions.
///
/// Fixed for the lifetime of one index; every chunk vector and every query
/// vector is validated against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Creates a standard 384-dimensional vector dimension.
    #[must_use]
    pub const fn dimension_384() -> Self {
        Self(VECTOR_DIMENSION_384)
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One index hit: a chunk and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub chunk: ChunkId,
    pub distance: f32,
}

impl Neighbor {
    #[must_use]
    pub fn new(chunk: ChunkId, distance: f32) -> Self {
        Self { chunk, distance }
    }

    /// Ordering used by every index: nearest first, ties by ascending chunk id.
    #[must_use]
    pub fn cmp_nearest(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.chunk.cmp(&other.chunk))
    }
}

/// Errors that can occur during vector operations.
///
/// All error messages include actionable suggestions for resolution.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure the index and the query use the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Invalid distance value: {value}\nReason: {reason}")]
    InvalidDistance { value: f32, reason: &'static str },

    #[error("Invalid result count k = {0}\nSuggestion: Request at least one neighbor")]
    InvalidK(usize),

    #[error(
        "Embedding generation failed: {0}\nSuggestion: Verify the embedding model is properly initialized"
    )]
    EmbeddingFailed(String),

    #[error(
        "Clustering failed: {0}\nSuggestion: Use fewer clusters or switch the index kind to \"flat\""
    )]
    ClusteringFailed(String),

    #[error("Too many vectors for one index: {0}\nSuggestion: Split the knowledge base")]
    CapacityExceeded(usize),
}
