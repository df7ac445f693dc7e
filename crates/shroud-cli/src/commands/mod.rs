//! CLI command implementations.

pub mod anonymize;
pub mod check;
