//! The index seam between the retriever and the nearest-neighbor structure.

use serde::{Deserialize, Serialize};

use crate::vector::{FlatIndex, IvfFlatIndex, IvfParams, Neighbor, VectorDimension, VectorError};

/// Nearest-neighbor index over chunk vectors.
///
/// Implementations are immutable once built. A knowledge-base change means
/// building a new index from the full vector set, never patching one in place.
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Returns up to `k` neighbors of `query`, nearest first.
    ///
    /// # Errors
    /// `InvalidK` when `k == 0`; `DimensionMismatch` when the query length
    /// differs from the indexed vectors. An empty index returns `Ok(vec![])`
    /// for any query.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorError>;

    /// Number of indexed vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension, or `None` for an index built from zero vectors.
    fn dimension(&self) -> Option<VectorDimension>;

    fn kind(&self) -> IndexKind;
}

/// Which index implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// Exact brute-force scan
    #[default]
    Flat,
    /// K-means inverted file, approximate
    IvfFlat,
}

impl IndexKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::IvfFlat => "ivf_flat",
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "flat" => Ok(Self::Flat),
            "ivf_flat" | "ivf" => Ok(Self::IvfFlat),
            other => Err(format!(
                "unknown index kind '{other}', expected 'flat' or 'ivf_flat'"
            )),
        }
    }
}

/// Builds an index of the requested kind from vectors ordered by chunk id.
pub fn build_index(
    kind: IndexKind,
    vectors: &[Vec<f32>],
    ivf: IvfParams,
) -> Result<Box<dyn VectorIndex>, VectorError> {
    Ok(match kind {
        IndexKind::Flat => Box::new(FlatIndex::build(vectors)?),
        IndexKind::IvfFlat => Box::new(IvfFlatIndex::build(vectors, ivf)?),
    })
}
