//! Approximate nearest-neighbor search with an inverted-file (IVF-Flat) layout.
//!
//! Chunk vectors are partitioned by K-means into cells. A query only scans
//! the cells whose centroids are nearest to it, trading recall for speed on
//! large knowledge bases.
//!
//! # Algorithm
//! 1. Rank centroids by distance to the query
//! 2. Take the `search_cells` nearest cells
//! 3. Scan every vector in those cells exactly
//! 4. Return the top-k by distance

use crate::vector::{
    ChunkId, FlatIndex, IndexKind, Neighbor, VectorDimension, VectorError, VectorIndex,
    kmeans_clustering, squared_euclidean,
};

/// Minimum number of clusters for K-means clustering.
const MIN_CLUSTERS: usize = 1;

/// Maximum number of clusters for K-means clustering.
const MAX_CLUSTERS: usize = 100;

/// Build parameters for [`IvfFlatIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IvfParams {
    /// Number of cells; `None` picks `ceil(sqrt(n))` clamped to 1..=100.
    pub clusters: Option<usize>,
    /// Number of nearest cells scanned per query.
    pub search_cells: usize,
    /// Seed for K-means++ initialization.
    pub seed: u64,
}

impl Default for IvfParams {
    fn default() -> Self {
        Self {
            clusters: None,
            search_cells: 4,
            seed: 42,
        }
    }
}

/// Inverted-file index with exact scanning inside each searched cell.
#[derive(Debug, Clone)]
pub struct IvfFlatIndex {
    /// Vector storage, addressed by chunk id
    vectors: FlatIndex,

    /// Cell centroids
    centroids: Vec<Vec<f32>>,

    /// Chunk ids per cell, parallel to `centroids`
    cells: Vec<Vec<ChunkId>>,

    search_cells: usize,
}

impl IvfFlatIndex {
    /// Builds the index from vectors ordered by chunk id.
    pub fn build(vectors: &[Vec<f32>], params: IvfParams) -> Result<Self, VectorError> {
        if params.search_cells == 0 {
            return Err(VectorError::ClusteringFailed(
                "search_cells must be at least 1".to_string(),
            ));
        }

        let storage = FlatIndex::build(vectors)?;
        if vectors.is_empty() {
            return Ok(Self {
                vectors: storage,
                centroids: Vec::new(),
                cells: Vec::new(),
                search_cells: params.search_cells,
            });
        }

        let k = params
            .clusters
            .unwrap_or_else(|| (vectors.len() as f32).sqrt().ceil() as usize)
            .clamp(MIN_CLUSTERS, MAX_CLUSTERS)
            .min(vectors.len());

        let refs: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
        let clustering = kmeans_clustering(&refs, k, params.seed)
            .map_err(|e| VectorError::ClusteringFailed(e.to_string()))?;

        let mut cells = vec![Vec::new(); clustering.centroids.len()];
        for (i, &cell) in clustering.assignments.iter().enumerate() {
            cells[cell].push(ChunkId::new(i as u32));
        }

        tracing::debug!(
            "Built IVF index: {} vectors in {} cells after {} k-means iterations",
            vectors.len(),
            cells.len(),
            clustering.iterations
        );

        Ok(Self {
            vectors: storage,
            centroids: clustering.centroids,
            cells,
            search_cells: params.search_cells,
        })
    }

    /// Number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cell sizes, parallel to the centroids.
    #[must_use]
    pub fn cell_sizes(&self) -> Vec<usize> {
        self.cells.iter().map(Vec::len).collect()
    }

    fn nearest_cells(&self, query: &[f32]) -> Vec<usize> {
        let mut ranked: Vec<(usize, f32)> = self
            .centroids
            .iter()
            .enumerate()
            .map(|(i, c)| (i, squared_euclidean(query, c)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(self.search_cells)
            .map(|(i, _)| i)
            .collect()
    }
}

impl VectorIndex for IvfFlatIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError> {
        if k == 0 {
            return Err(VectorError::InvalidK(k));
        }
        let Some(dimension) = self.vectors.dimension() else {
            return Ok(Vec::new());
        };
        dimension.validate_vector(query)?;

        let mut neighbors = Vec::new();
        for cell in self.nearest_cells(query) {
            for &id in &self.cells[cell] {
                if let Some(vector) = self.vectors.vector(id) {
                    neighbors.push(Neighbor::new(id, squared_euclidean(query, vector)));
                }
            }
        }

        neighbors.sort_by(Neighbor::cmp_nearest);
        neighbors.truncate(k);
        Ok(neighbors)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimension(&self) -> Option<VectorDimension> {
        self.vectors.dimension()
    }

    fn kind(&self) -> IndexKind {
        IndexKind::IvfFlat
    }
}
