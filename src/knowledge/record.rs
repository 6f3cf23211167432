//! Knowledge records and their document rendering.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// The five columns every knowledge file must provide, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeField {
    ItemFunction,
    FailureMode,
    Effects,
    Causes,
    Controls,
}

impl KnowledgeField {
    pub const ALL: [KnowledgeField; 5] = [
        KnowledgeField::ItemFunction,
        KnowledgeField::FailureMode,
        KnowledgeField::Effects,
        KnowledgeField::Causes,
        KnowledgeField::Controls,
    ];

    /// Column header in the CSV export.
    #[must_use]
    pub const fn header(self) -> &'static str {
        match self {
            Self::ItemFunction => "Item/Function",
            Self::FailureMode => "Failure Mode",
            Self::Effects => "Effects of Failure",
            Self::Causes => "Potential Cause(s)",
            Self::Controls => "Recommended Actions",
        }
    }

    /// Label used when rendering the record as a document.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ItemFunction => "Item/Function",
            Self::FailureMode => "Failure Mode",
            Self::Effects => "Effects",
            Self::Causes => "Causes",
            Self::Controls => "Controls",
        }
    }
}

/// One row of the FMEA sheet.
///
/// Identified by its 0-based row position in the source table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub position: usize,
    pub item: String,
    pub failure_mode: String,
    pub effects: String,
    pub causes: String,
    pub controls: String,
}

impl KnowledgeRecord {
    /// Value of a single field.
    #[must_use]
    pub fn field(&self, field: KnowledgeField) -> &str {
        match field {
            KnowledgeField::ItemFunction => &self.item,
            KnowledgeField::FailureMode => &self.failure_mode,
            KnowledgeField::Effects => &self.effects,
            KnowledgeField::Causes => &self.causes,
            KnowledgeField::Controls => &self.controls,
        }
    }

    pub(crate) fn set_field(&mut self, field: KnowledgeField, value: String) {
        let slot = match field {
            KnowledgeField::ItemFunction => &mut self.item,
            KnowledgeField::FailureMode => &mut self.failure_mode,
            KnowledgeField::Effects => &mut self.effects,
            KnowledgeField::Causes => &mut self.causes,
            KnowledgeField::Controls => &mut self.controls,
        };
        *slot = value;
    }

    /// Flattens the record into labeled lines, one per field, in fixed order.
    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut text = String::new();
        for field in KnowledgeField::ALL {
            // Writing to a String cannot fail
            let _ = writeln!(text, "{}: {}", field.label(), self.field(field));
        }
        Document {
            record: self.position,
            text,
        }
    }
}

/// Text rendering of one record, 1:1 with [`KnowledgeRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Position of the source record
    pub record: usize,
    pub text: String,
}
