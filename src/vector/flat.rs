//! Exact nearest-neighbor search by brute-force scan.
//!
//! The reference index: every query is compared against every stored vector.
//! For knowledge bases of a few thousand chunks this is fast enough and, unlike
//! the clustered index, never misses a neighbor.

use crate::vector::{
    ChunkId, IndexKind, Neighbor, VectorDimension, VectorError, VectorIndex, squared_euclidean,
};

/// Flat (exhaustive) index over chunk vectors.
///
/// Vectors are stored contiguously; chunk `i` occupies
/// `data[i * dim..(i + 1) * dim]`.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    data: Vec<f32>,
    dimension: Option<VectorDimension>,
    len: usize,
}

impl FlatIndex {
    /// Builds the index from vectors ordered by chunk id.
    ///
    /// An empty input yields a valid empty index. Vectors of unequal length
    /// fail with `DimensionMismatch`.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self, VectorError> {
        let Some(first) = vectors.first() else {
            return Ok(Self {
                data: Vec::new(),
                dimension: None,
                len: 0,
            });
        };

        let dimension = VectorDimension::new(first.len())?;
        if ChunkId::from_index(vectors.len() - 1).is_none() {
            return Err(VectorError::CapacityExceeded(vectors.len()));
        }

        let mut data = Vec::with_capacity(vectors.len() * dimension.get());
        for vector in vectors {
            dimension.validate_vector(vector)?;
            data.extend_from_slice(vector);
        }

        Ok(Self {
            data,
            dimension: Some(dimension),
            len: vectors.len(),
        })
    }

    /// Returns the stored vector for a chunk.
    #[must_use]
    pub fn vector(&self, id: ChunkId) -> Option<&[f32]> {
        let dim = self.dimension?.get();
        let start = id.as_index().checked_mul(dim)?;
        self.data.get(start..start + dim)
    }

    fn iter(&self) -> impl Iterator<Item = (ChunkId, &[f32])> {
        let dim = self.dimension.map_or(1, |d| d.get());
        self.data
            .chunks_exact(dim)
            .enumerate()
            .map(|(i, v)| (ChunkId::new(i as u32), v))
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        if k == 0 {
            return Err(VectorError::InvalidK(k));
        }
        let Some(dimension) = self.dimension else {
            // Empty index: nothing to compare against, not an error
            return Ok(Vec::new());
        };
        dimension.validate_vector(query)?;

        let mut neighbors: Vec<Neighbor> = self
            .iter()
            .map(|(id, vector)| Neighbor::new(id, squared_euclidean(query, vector)))
            .collect();

        neighbors.sort_by(Neighbor::cmp_nearest);
        neighbors.truncate(k);
        Ok(neighbors)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn dimension(&self) -> Option<VectorDimension> {
        self.dimension
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Flat
    }
}
