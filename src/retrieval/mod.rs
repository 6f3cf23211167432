//! Query-time retrieval: embed the query, search the index, turn distances
//! into relevance, drop everything below the threshold.
//!
//! No evidence is a normal outcome. It comes back as
//! [`RetrievalResult::NotEnoughData`], whose text form is the reserved
//! [`NOT_ENOUGH_DATA`] marker.

mod context;

pub use context::{GenerationInput, assemble};

use serde::Serialize;

use crate::chunking::ChunkCorpus;
use crate::config::{validate_k, validate_threshold};
use crate::error::{EngineResult, RetrievalError};
use crate::vector::{ChunkId, EmbeddingGenerator, Relevance, VectorIndex, validate_batch};

/// Reserved marker meaning "no chunk cleared the relevance threshold".
///
/// Consumers must special-case it; it is never retrieved content.
pub const NOT_ENOUGH_DATA: &str = "NOT ENOUGH DATA";

/// A chunk that cleared the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: ChunkId,
    /// Position of the source record
    pub document: usize,
    pub text: String,
    pub distance: f32,
    pub relevance: Relevance,
}

/// Outcome of one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "chunks", rename_all = "snake_case")]
pub enum RetrievalResult {
    /// Non-empty, relevance non-increasing, at most `k` entries
    Evidence(Vec<RetrievedChunk>),
    NotEnoughData,
}

impl RetrievalResult {
    fn from_chunks(chunks: Vec<RetrievedChunk>) -> Self {
        if chunks.is_empty() {
            Self::NotEnoughData
        } else {
            Self::Evidence(chunks)
        }
    }

    #[must_use]
    pub fn is_not_enough_data(&self) -> bool {
        matches!(self, Self::NotEnoughData)
    }

    /// Retrieved chunks; empty for the sentinel.
    #[must_use]
    pub fn chunks(&self) -> &[RetrievedChunk] {
        match self {
            Self::Evidence(chunks) => chunks,
            Self::NotEnoughData => &[],
        }
    }

    /// Chunk texts in relevance order, or the single sentinel marker.
    #[must_use]
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Self::Evidence(chunks) => chunks.iter().map(|c| c.text.as_str()).collect(),
            Self::NotEnoughData => vec![NOT_ENOUGH_DATA],
        }
    }
}

/// Runs queries against one built index.
///
/// Borrows everything it needs; it never mutates the index or the corpus,
/// so any number of retrievers can share them.
pub struct Retriever<'a> {
    embedder: &'a dyn EmbeddingGenerator,
    index: &'a dyn VectorIndex,
    corpus: &'a ChunkCorpus,
}

impl<'a> Retriever<'a> {
    pub fn new(
        embedder: &'a dyn EmbeddingGenerator,
        index: &'a dyn VectorIndex,
        corpus: &'a ChunkCorpus,
    ) -> Self {
        Self {
            embedder,
            index,
            corpus,
        }
    }

    /// Top `k` chunks whose relevance is at least `threshold`.
    ///
    /// # Errors
    /// `Configuration` for `k == 0` or a negative/NaN threshold,
    /// `DimensionMismatch` when the query vector does not fit the index,
    /// `Embedding` when the embedder fails.
    pub fn retrieve(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
    ) -> EngineResult<RetrievalResult> {
        validate_k(k)?;
        validate_threshold(threshold)?;

        if query.trim().is_empty() {
            tracing::warn!("Blank query, retrieval will rely on the embedder's default vector");
        }

        let mut embeddings = self.embedder.generate_embeddings(&[query])?;
        validate_batch(self.embedder.dimension(), 1, &embeddings)?;
        let query_vector = embeddings.pop().unwrap_or_default();

        let neighbors = self.index.search(&query_vector, k)?;
        let candidates = neighbors.len();

        let mut chunks = Vec::with_capacity(candidates);
        for neighbor in neighbors {
            let relevance = Relevance::from_distance(neighbor.distance)?;
            if !relevance.meets(threshold) {
                // Neighbors are nearest first, nothing after this can pass
                break;
            }
            let chunk = self.corpus.get(neighbor.chunk).ok_or_else(|| {
                RetrievalError::IndexBuild(format!(
                    "index returned chunk {} but the corpus holds {}",
                    neighbor.chunk,
                    self.corpus.len()
                ))
            })?;
            chunks.push(RetrievedChunk {
                chunk: chunk.id,
                document: chunk.document,
                text: chunk.text.clone(),
                distance: neighbor.distance,
                relevance,
            });
        }

        tracing::debug!(
            "Query {query:?}: k={k}, threshold={threshold}, {candidates} candidates, {} kept",
            chunks.len()
        );

        Ok(RetrievalResult::from_chunks(chunks))
    }
}
