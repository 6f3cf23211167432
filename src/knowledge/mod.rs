//! FMEA knowledge base: records loaded from a CSV export and their flat
//! text rendering.
//!
//! The knowledge base is read once and never mutated afterwards. A changed
//! sheet means loading a new [`KnowledgeBase`] and rebuilding the engine.

mod loader;
mod record;

pub use loader::KnowledgeBase;
pub use record::{Document, KnowledgeField, KnowledgeRecord};
