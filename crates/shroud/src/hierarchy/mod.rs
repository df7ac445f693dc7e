//! Generalization hierarchies for quasi-identifying and sensitive attributes.

mod error;
mod model;

pub use error::HierarchyError;
pub use model::{Hierarchy, HierarchyBuilder};
