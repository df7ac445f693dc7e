//! Attribute roles and the data definition that binds them to columns.

mod definition;
mod types;

pub use definition::DataDefinition;
pub use types::AttributeType;
