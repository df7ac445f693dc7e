//! Producing the released table from the chosen transformation.

mod applier;
mod operations;

pub use applier::TransformationApplier;
pub use operations::{ColumnChange, ColumnOperation, TransformSummary};
