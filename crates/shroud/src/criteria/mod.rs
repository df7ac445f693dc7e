//! Privacy criteria and their evaluation on equivalence classes.
//!
//! Criteria are combined with logical AND. A class that fails any criterion is
//! an outlier; a node is anonymous when all outlier records together fit the
//! suppression budget.

mod closeness;
mod criterion;
mod evaluator;

pub use closeness::{SensitiveTree, equal_distance};
pub use criterion::PrivacyCriterion;
pub use evaluator::{Assessment, CriterionSet, PreparedCriterion, SuppressionBudget, Verdict};
