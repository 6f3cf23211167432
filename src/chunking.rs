//! Segmenter: splits documents into overlapping word windows.
//!
//! A window holds at most `chunk_size` words and starts `chunk_size - overlap`
//! words after its predecessor. Windows stop at the first one that reaches
//! the end of the document, and any window shorter than `min_chunk_words`
//! is dropped.

use serde::Serialize;

use crate::config::ChunkingConfig;
use crate::error::{EngineResult, RetrievalError};
use crate::knowledge::Document;
use crate::vector::ChunkId;

/// Validated segmenter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    chunk_size: usize,
    overlap: usize,
    min_chunk_words: usize,
}

impl ChunkingParams {
    /// # Errors
    /// `Configuration` when `chunk_size == 0`, `overlap >= chunk_size` or
    /// `min_chunk_words > chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize, min_chunk_words: usize) -> EngineResult<Self> {
        if chunk_size == 0 {
            return Err(RetrievalError::config("chunk_size must be at least 1"));
        }
        if overlap >= chunk_size {
            return Err(RetrievalError::config(format!(
                "overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        if min_chunk_words > chunk_size {
            return Err(RetrievalError::config(format!(
                "min_chunk_words ({min_chunk_words}) cannot exceed chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
            min_chunk_words,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> EngineResult<Self> {
        Self::new(config.chunk_size, config.overlap, config.min_chunk_words)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn min_chunk_words(&self) -> usize {
        self.min_chunk_words
    }

    /// Words between the starts of consecutive windows, always >= 1.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Splits `text` on whitespace into overlapping windows.
///
/// Each window is returned as its words joined by single spaces. The result
/// is a pure function of the inputs.
pub fn segment(text: &str, params: &ChunkingParams) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut windows = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + params.chunk_size).min(words.len());
        if end - start >= params.min_chunk_words {
            windows.push(words[start..end].join(" "));
        }
        if end == words.len() {
            break;
        }
        start += params.stride();
    }

    windows
}

/// One window of one document; the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub id: ChunkId,
    /// Position of the source record
    pub document: usize,
    /// Position of this window within its document
    pub ordinal: usize,
    pub text: String,
    pub word_count: usize,
}

/// Flat chunk sequence, indexed 0..N-1 by [`ChunkId`].
#[derive(Debug, Clone, Default)]
pub struct ChunkCorpus {
    chunks: Vec<Chunk>,
}

impl ChunkCorpus {
    /// Segments every document, in order, into one flat sequence.
    ///
    /// # Errors
    /// `Configuration` if the corpus outgrows the `u32` chunk id space.
    pub fn from_documents(documents: &[Document], params: &ChunkingParams) -> EngineResult<Self> {
        let mut chunks = Vec::new();
        for document in documents {
            for (ordinal, text) in segment(&document.text, params).into_iter().enumerate() {
                let id = ChunkId::from_index(chunks.len()).ok_or_else(|| {
                    RetrievalError::config("knowledge base produces more chunks than fit in u32")
                })?;
                chunks.push(Chunk {
                    id,
                    document: document.record,
                    ordinal,
                    word_count: text.split(' ').count(),
                    text,
                });
            }
        }
        Ok(Self { chunks })
    }

    #[must_use]
    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id.as_index())
    }

    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Chunk texts in id order, ready for embedding.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|chunk| chunk.text.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
