//! Retrieval-augmented knowledge lookup over FMEA failure-analysis records.
//!
//! Records are rendered to text, segmented into overlapping word windows,
//! embedded, and indexed for nearest-neighbor search. A query returns the
//! most relevant chunks above a relevance threshold, or the reserved
//! `NOT ENOUGH DATA` marker when nothing qualifies.

pub mod chunking;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod knowledge;
pub mod retrieval;
pub mod vector;

// Explicit exports for better API clarity
pub use chunking::{Chunk, ChunkCorpus, ChunkingParams, segment};
pub use config::Settings;
pub use engine::{EngineStats, KnowledgeEngine, KnowledgeSnapshot};
pub use error::{EngineResult, KnowledgeError, KnowledgeResult, RetrievalError};
pub use knowledge::{Document, KnowledgeBase, KnowledgeField, KnowledgeRecord};
pub use retrieval::{
    GenerationInput, NOT_ENOUGH_DATA, RetrievalResult, RetrievedChunk, Retriever, assemble,
};
pub use vector::{
    ChunkId, EmbeddingGenerator, FlatIndex, HashEmbedder, IndexKind, IvfFlatIndex, IvfParams,
    Relevance, VectorDimension, VectorError, VectorIndex,
};
