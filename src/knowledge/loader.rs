//! CSV loading for the knowledge base.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{KnowledgeError, KnowledgeResult};
use crate::knowledge::{Document, KnowledgeField, KnowledgeRecord};

/// Immutable set of FMEA records, in source row order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    records: Vec<KnowledgeRecord>,
    origin: Option<PathBuf>,
}

impl KnowledgeBase {
    /// Load records from a CSV file with a header row.
    ///
    /// # Errors
    /// Fails if the file cannot be opened, is not valid CSV, or lacks one of
    /// the required columns.
    pub fn load_csv(path: impl AsRef<Path>) -> KnowledgeResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| KnowledgeError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let base = Self::from_reader(file, path)?;
        tracing::info!(
            "Loaded {} knowledge records from {}",
            base.len(),
            path.display()
        );
        Ok(base)
    }

    /// Load records from any CSV source. `origin` names the source in errors.
    pub fn from_reader(reader: impl Read, origin: impl AsRef<Path>) -> KnowledgeResult<Self> {
        let origin = origin.as_ref().to_path_buf();
        let csv_error = |source: csv::Error| KnowledgeError::Csv {
            path: origin.clone(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers().map_err(csv_error)?.clone();
        let mut columns = Vec::with_capacity(KnowledgeField::ALL.len());
        for field in KnowledgeField::ALL {
            let column = headers
                .iter()
                .position(|header| header.trim() == field.header())
                .ok_or_else(|| KnowledgeError::MissingColumn {
                    path: origin.clone(),
                    column: field.header(),
                })?;
            columns.push((field, column));
        }

        let mut records = Vec::new();
        for (position, row) in reader.records().enumerate() {
            let row = row.map_err(csv_error)?;
            let mut record = KnowledgeRecord {
                position,
                ..KnowledgeRecord::default()
            };
            for &(field, column) in &columns {
                record.set_field(field, row.get(column).unwrap_or_default().to_string());
            }
            records.push(record);
        }

        Ok(Self {
            records,
            origin: Some(origin),
        })
    }

    /// Wrap records built in memory. Positions are reassigned in order.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = KnowledgeRecord>) -> Self {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(position, record)| KnowledgeRecord { position, ..record })
            .collect();
        Self {
            records,
            origin: None,
        }
    }

    #[must_use]
    pub fn records(&self) -> &[KnowledgeRecord] {
        &self.records
    }

    /// Renders every record, preserving row order.
    #[must_use]
    pub fn documents(&self) -> Vec<Document> {
        self.records
            .iter()
            .map(KnowledgeRecord::to_document)
            .collect()
    }

    /// File the records came from, if any.
    #[must_use]
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
