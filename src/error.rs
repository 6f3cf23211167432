//! Error types for the knowledge lookup engine
//!
//! Configuration and dimension problems are caller errors and fail fast.
//! A query with no relevant evidence is not an error at all; it comes back as
//! `RetrievalResult::NotEnoughData`.

use crate::vector::VectorError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the knowledge base
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Failed to read knowledge file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed CSV in '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error(
        "Knowledge file '{path}' is missing required column '{column}'\nSuggestion: The header row must contain: Item/Function, Failure Mode, Effects of Failure, Potential Cause(s), Recommended Actions"
    )]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// Main error type for retrieval operations
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Invalid chunking parameters, k, threshold or index settings
    #[error("Invalid configuration: {reason}")]
    Configuration { reason: String },

    /// Embedder output or query vector does not match the index
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}. The embedder does not match the one the index was built with."
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),
}

impl RetrievalError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Get a stable status code for this error type.
    ///
    /// Returns a string identifier that can be used in JSON responses
    /// for programmatic error handling.
    pub fn status_code(&self) -> String {
        match self {
            Self::Configuration { .. } => "CONFIG_ERROR",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::IndexBuild(_) => "INDEX_BUILD_ERROR",
            Self::Knowledge(KnowledgeError::FileRead { .. }) => "FILE_READ_ERROR",
            Self::Knowledge(KnowledgeError::Csv { .. }) => "CSV_ERROR",
            Self::Knowledge(KnowledgeError::MissingColumn { .. }) => "MISSING_COLUMN",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Configuration { .. } => vec![
                "Check [chunking], [retrieval] and [index] in .fmea/settings.toml",
                "overlap must be smaller than chunk_size and k must be at least 1",
            ],
            Self::DimensionMismatch { .. } => vec![
                "Rebuild the index after changing [embedding].model",
                "Do not mix vectors from different embedding models",
            ],
            Self::Embedding(_) => vec![
                "Check network access for the first model download",
                "Set [embedding].model = \"hash\" to run without a neural model",
            ],
            Self::Knowledge(KnowledgeError::FileRead { .. }) => {
                vec!["Check [knowledge].path or pass --knowledge <CSV>"]
            }
            Self::Knowledge(KnowledgeError::MissingColumn { .. }) => {
                vec!["Export the FMEA sheet with its original column headers"]
            }
            _ => vec![],
        }
    }
}

impl From<VectorError> for RetrievalError {
    fn from(error: VectorError) -> Self {
        match error {
            VectorError::DimensionMismatch { expected, actual } => {
                Self::DimensionMismatch { expected, actual }
            }
            VectorError::InvalidK(k) => Self::config(format!("k must be at least 1, got {k}")),
            VectorError::EmbeddingFailed(reason) => Self::Embedding(reason),
            other @ VectorError::InvalidDistance { .. } => Self::Embedding(other.to_string()),
            other => Self::IndexBuild(other.to_string()),
        }
    }
}

/// Result type alias for retrieval operations
pub type EngineResult<T> = Result<T, RetrievalError>;

/// Result type alias for knowledge loading
pub type KnowledgeResult<T> = Result<T, KnowledgeError>;
