//! Error types for the shroud library.

use std::path::PathBuf;
use thiserror::Error;

use crate::hierarchy::HierarchyError;

/// Main error type for shroud operations.
///
/// A search that proves no transformation satisfies the criteria is not an
/// error; it is reported through
/// [`AnonymizationResult::is_result_available`](crate::AnonymizationResult::is_result_available).
#[derive(Debug, Error)]
pub enum ShroudError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing CSV/TSV data.
    #[error("Parse error at row {row}, column {column}: {message}")]
    Parse {
        row: usize,
        column: usize,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file or no data to anonymize.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Invalid attribute roles or configuration options, detected before search.
    #[error("Configuration error for '{subject}': {message}")]
    Configuration { subject: String, message: String },

    /// Malformed or incomplete generalization hierarchy.
    #[error("Invalid hierarchy for '{attribute}': {source}")]
    InvalidHierarchy {
        attribute: String,
        #[source]
        source: HierarchyError,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ShroudError {
    /// Build a configuration error naming the offending attribute or option.
    pub fn config(subject: impl Into<String>, message: impl Into<String>) -> Self {
        ShroudError::Configuration {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Attach an attribute name to a hierarchy defect.
    pub fn hierarchy(attribute: impl Into<String>, source: HierarchyError) -> Self {
        ShroudError::InvalidHierarchy {
            attribute: attribute.into(),
            source,
        }
    }

    /// Returns true for errors raised by pre-search validation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ShroudError::Configuration { .. } | ShroudError::InvalidHierarchy { .. }
        )
    }
}

/// Result type alias for shroud operations.
pub type Result<T> = std::result::Result<T, ShroudError>;
