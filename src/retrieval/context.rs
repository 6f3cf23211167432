//! Context assembly for the downstream generation step.

use serde::Serialize;

use super::{NOT_ENOUGH_DATA, RetrievalResult};

/// Joins retrieved chunk texts with `separator`, most relevant first.
///
/// The sentinel passes through unchanged so the generation step can detect
/// it verbatim. No truncation is applied.
pub fn assemble(result: &RetrievalResult, separator: &str) -> String {
    match result {
        RetrievalResult::NotEnoughData => NOT_ENOUGH_DATA.to_string(),
        RetrievalResult::Evidence(_) => result.texts().join(separator),
    }
}

/// What the generation collaborator receives: the user's query and the
/// assembled knowledge context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationInput {
    pub query: String,
    pub context: String,
    #[serde(rename = "has_evidence")]
    evidence: bool,
}

impl GenerationInput {
    pub fn new(query: impl Into<String>, result: &RetrievalResult, separator: &str) -> Self {
        Self {
            query: query.into(),
            context: assemble(result, separator),
            evidence: !result.is_not_enough_data(),
        }
    }

    /// False when retrieval came back with the sentinel. Follows the
    /// retrieval outcome, not the context text.
    #[must_use]
    pub fn has_evidence(&self) -> bool {
        self.evidence
    }
}
