//! Structural defects of a hierarchy table.

use thiserror::Error;

/// Why a hierarchy table was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HierarchyError {
    /// The table has no rows.
    #[error("hierarchy has no rows")]
    Empty,

    /// A row has no cells at all.
    #[error("row {row} is empty")]
    EmptyRow { row: usize },

    /// A row's length differs from the first row's length.
    #[error("row for '{value}' has {found} levels, expected {expected}")]
    RaggedRow {
        value: String,
        expected: usize,
        found: usize,
    },

    /// The same raw value appears on two rows.
    #[error("value '{value}' appears on more than one row")]
    DuplicateValue { value: String },

    /// Two values merged at `level` are split again at `level + 1`.
    #[error("'{value}' at level {level} generalizes to both '{first}' and '{second}'")]
    NonMonotone {
        level: usize,
        value: String,
        first: String,
        second: String,
    },

    /// A dataset value is not covered by the hierarchy.
    #[error("value '{value}' is not covered by the hierarchy")]
    MissingValue { value: String },

    /// A sensitive-value hierarchy must converge to one root.
    #[error("top level has {count} distinct values, expected a single root")]
    MultipleRoots { count: usize },

    /// A hierarchy of height one cannot measure distances.
    #[error("hierarchy of height {height} has no generalization levels")]
    NoGeneralization { height: usize },
}
