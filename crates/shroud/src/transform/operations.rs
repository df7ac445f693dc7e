//! Per-column operations performed when releasing a table.

use serde::{Deserialize, Serialize};

/// What the applier does to one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ColumnOperation {
    /// Replace values by their representative at `level`.
    Generalize { column: String, level: usize },

    /// Replace every value with the suppression marker.
    Mask { column: String },

    /// Copy values unchanged.
    Retain { column: String },
}

impl ColumnOperation {
    /// Column the operation applies to.
    pub fn column(&self) -> &str {
        match self {
            ColumnOperation::Generalize { column, .. }
            | ColumnOperation::Mask { column }
            | ColumnOperation::Retain { column } => column,
        }
    }

    /// Get a human-readable description of the operation.
    pub fn description(&self) -> String {
        match self {
            ColumnOperation::Generalize { column, level } => {
                format!("Generalize '{}' to level {}", column, level)
            }
            ColumnOperation::Mask { column } => format!("Mask '{}'", column),
            ColumnOperation::Retain { column } => format!("Retain '{}'", column),
        }
    }
}

/// Effect of one column operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnChange {
    /// Operation applied.
    pub operation: ColumnOperation,

    /// Number of cells whose value differs from the input.
    pub values_changed: usize,
}

/// Summary of a released table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSummary {
    /// Input positions of suppressed records, ascending.
    pub suppressed_rows: Vec<usize>,

    /// One entry per column, in column order.
    pub changes: Vec<ColumnChange>,
}

impl TransformSummary {
    /// Number of suppressed records.
    pub fn suppressed_count(&self) -> usize {
        self.suppressed_rows.len()
    }

    /// Total number of cells changed.
    pub fn cells_changed(&self) -> usize {
        self.changes.iter().map(|c| c.values_changed).sum()
    }
}
