//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success - evidence was found
//! - `1`: General error - unspecified failure
//! - `2`: Blocking error - the embedder does not match the index
//! - `3-125`: Specific recoverable errors
//! - `126-255`: Reserved by shell

use crate::error::{KnowledgeError, RetrievalError};
use crate::retrieval::RetrievalResult;

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Critical error that should halt automation (code 2)
    BlockingError = 2,

    /// No chunk cleared the relevance threshold (code 3)
    NotFound = 3,

    /// Malformed knowledge file (code 4)
    ParseError = 4,

    /// File I/O error (code 5)
    IoError = 5,

    /// Configuration error (code 6)
    ConfigError = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    /// `NotFound` for the sentinel, `Success` otherwise.
    pub fn from_retrieval(result: &RetrievalResult) -> Self {
        if result.is_not_enough_data() {
            ExitCode::NotFound
        } else {
            ExitCode::Success
        }
    }

    /// Convert a `RetrievalError` to the appropriate exit code.
    pub fn from_error(error: &RetrievalError) -> Self {
        match error {
            RetrievalError::Configuration { .. } => ExitCode::ConfigError,

            // A swapped embedder must stop automation
            RetrievalError::DimensionMismatch { .. } => ExitCode::BlockingError,

            RetrievalError::Knowledge(KnowledgeError::FileRead { .. }) => ExitCode::IoError,
            RetrievalError::Knowledge(KnowledgeError::Csv { .. })
            | RetrievalError::Knowledge(KnowledgeError::MissingColumn { .. }) => {
                ExitCode::ParseError
            }

            RetrievalError::Embedding(_) | RetrievalError::IndexBuild(_) => ExitCode::GeneralError,
        }
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - automation should halt",
            ExitCode::NotFound => "Not enough data",
            ExitCode::ParseError => "Knowledge file parse error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
        }
    }
}
