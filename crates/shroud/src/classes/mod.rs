//! Equivalence classes and their per-class statistics.

mod analyzer;
mod frequency;

pub use analyzer::{ClassAnalyzer, ClassRequirements, EquivalenceClass, EquivalenceClasses};
pub use frequency::FrequencyTable;
