//! Vector embedding and nearest-neighbor search.
//!
//! # Architecture
//! Chunk texts are embedded once through an [`EmbeddingGenerator`], and the
//! resulting vectors are loaded into a [`VectorIndex`]. Two index
//! implementations share the same contract and the same metric (squared
//! Euclidean distance):
//!
//! - [`FlatIndex`]: exact brute-force scan, the reference implementation
//! - [`IvfFlatIndex`]: K-means inverted file, scans only the nearest cells
//!
//! Indexes are immutable after `build`; a changed knowledge base means a new
//! index.

mod clustering;
mod distance;
mod embedding;
mod flat;
mod index;
mod ivf;
mod types;

// Re-export core types for public API
pub use clustering::{
    ClusteringError, KMeansResult, assign_to_nearest_centroid, kmeans_clustering,
};
pub use distance::squared_euclidean;
#[cfg(test)]
pub use embedding::MockEmbeddingGenerator;
pub use embedding::{
    EmbeddingGenerator, FastEmbedGenerator, HASH_EMBEDDER_NAME, HashEmbedder, create_embedder,
    default_models_dir, parse_embedding_model, validate_batch,
};
pub use flat::FlatIndex;
pub use index::{IndexKind, VectorIndex, build_index};
pub use ivf::{IvfFlatIndex, IvfParams};
pub use types::{ChunkId, Neighbor, Relevance, VECTOR_DIMENSION_384, VectorDimension, VectorError};
