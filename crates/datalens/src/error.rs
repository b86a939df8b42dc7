//! Error types for the datalens engine.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for datalens operations.
///
/// Only dataset-level structural problems surface here. Per-column trouble
/// (malformed cells, degenerate distributions, undersized samples) is absorbed
/// by the component that hit it and never reaches the caller.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The dataset has no records.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// The schema profile was built for a different column set.
    #[error("Schema mismatch: missing columns {missing:?}, unexpected columns {unexpected:?}")]
    SchemaMismatch {
        /// Columns the schema describes that the dataset no longer has.
        missing: Vec<String>,
        /// Columns the dataset has that the schema does not describe.
        unexpected: Vec<String>,
    },

    /// A record does not carry exactly the header's column set.
    #[error("Record {row} has columns {found:?}, expected {expected:?}")]
    InconsistentRecord {
        row: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// The same column name appears twice in a header.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl EngineError {
    /// Short, actionable message for end users.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineError::EmptyDataset(_) => "Upload data before running analysis.",
            EngineError::SchemaMismatch { .. } => {
                "Structure changed, re-run detection before scoring."
            }
            EngineError::InconsistentRecord { .. } | EngineError::DuplicateColumn(_) => {
                "The extracted table is malformed. Check the source document."
            }
            EngineError::Io { .. } | EngineError::Csv(_) => "The data file could not be read.",
            EngineError::Json(_) | EngineError::Config(_) => "The configuration is invalid.",
        }
    }
}

/// Result type alias for datalens operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a detector bypassed a column.
///
/// Never returned from the public entry points; logged at debug level.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorSkipped {
    #[error("column type {0} is not handled by this detector")]
    WrongType(crate::schema::InferredType),

    #[error("only {found} usable values, need {needed}")]
    InsufficientSample { needed: usize, found: usize },

    #[error("values have no spread")]
    ZeroSpread,

    #[error("malformed values: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages() {
        let empty = EngineError::EmptyDataset("no rows".to_string());
        assert!(empty.user_message().contains("Upload data"));

        let drift = EngineError::SchemaMismatch {
            missing: vec!["age".to_string()],
            unexpected: vec![],
        };
        assert!(drift.user_message().contains("re-run detection"));
        assert!(drift.to_string().contains("age"));
    }
}
