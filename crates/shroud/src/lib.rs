//! Shroud: hierarchy-based anonymization of tabular data.
//!
//! Shroud releases a table such that every group of records sharing the same
//! generalized quasi-identifiers meets a set of privacy criteria
//! (k-anonymity, l-diversity, t-closeness), choosing the generalization with
//! the least information loss.
//!
//! # Core Principles
//!
//! - **Optimal**: The transformation lattice is searched for the minimum-loss
//!   anonymous node, with monotonicity pruning
//! - **Non-destructive**: Input tables and definitions are never modified
//! - **Deterministic**: The same inputs and configuration give bit-identical output
//!
//! # Example
//!
//! ```no_run
//! use shroud::{AnonymizationConfig, Anonymizer, DataDefinition, Parser, PrivacyCriterion};
//!
//! let age = Parser::new().parse_hierarchy_file("age.csv", "age").unwrap();
//! let definition = DataDefinition::new().with_hierarchy("age", age);
//!
//! let config = AnonymizationConfig::new().with_criterion(PrivacyCriterion::k_anonymity(5));
//! let (result, _source) = Anonymizer::with_config(config)
//!     .anonymize_file("patients.tsv", &definition)
//!     .unwrap();
//!
//! if let Some(transformation) = &result.transformation {
//!     println!("Levels: {}", transformation);
//! }
//! ```

pub mod classes;
pub mod criteria;
pub mod dataset;
pub mod error;
pub mod hierarchy;
pub mod input;
pub mod lattice;
pub mod metric;
pub mod schema;
pub mod search;
pub mod transform;

mod anonymizer;
mod config;

pub use crate::anonymizer::{
    AnonymizationPlan, AnonymizationResult, Anonymizer, AttributeSummary,
};
pub use crate::config::AnonymizationConfig;
pub use criteria::PrivacyCriterion;
pub use error::{Result, ShroudError};
pub use hierarchy::{Hierarchy, HierarchyBuilder, HierarchyError};
pub use input::{DataTable, Parser, ParserConfig, SourceMetadata};
pub use lattice::Transformation;
pub use metric::{InfoLossMetric, InformationLoss};
pub use schema::{AttributeType, DataDefinition};
pub use search::{SearchConfig, SearchStatistics, SearchStrategy};
