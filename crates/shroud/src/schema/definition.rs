//! Attribute roles and hierarchies for one dataset.

use indexmap::IndexMap;

use crate::error::{Result, ShroudError};
use crate::hierarchy::Hierarchy;

use super::types::AttributeType;

/// Declares the role of each attribute and the hierarchy of each
/// quasi-identifier.
///
/// Attributes that are never declared are insensitive. A definition is read
/// during a run and never modified by it, so one definition can drive any
/// number of runs.
#[derive(Debug, Clone, Default)]
pub struct DataDefinition {
    attributes: IndexMap<String, AttributeType>,
    hierarchies: IndexMap<String, Hierarchy>,
}

impl DataDefinition {
    /// Create an empty definition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the role of an attribute.
    pub fn set_attribute_type(
        &mut self,
        name: impl Into<String>,
        attribute_type: AttributeType,
    ) -> &mut Self {
        self.attributes.insert(name.into(), attribute_type);
        self
    }

    /// Mark an attribute as quasi-identifying with the given hierarchy.
    pub fn set_hierarchy(&mut self, name: impl Into<String>, hierarchy: Hierarchy) -> &mut Self {
        let name = name.into();
        self.attributes
            .insert(name.clone(), AttributeType::QuasiIdentifying);
        self.hierarchies.insert(name, hierarchy);
        self
    }

    /// Builder form of [`set_attribute_type`](Self::set_attribute_type).
    pub fn with_attribute(mut self, name: impl Into<String>, attribute_type: AttributeType) -> Self {
        self.set_attribute_type(name, attribute_type);
        self
    }

    /// Builder form of [`set_hierarchy`](Self::set_hierarchy).
    pub fn with_hierarchy(mut self, name: impl Into<String>, hierarchy: Hierarchy) -> Self {
        self.set_hierarchy(name, hierarchy);
        self
    }

    /// Role of an attribute; undeclared attributes are insensitive.
    pub fn attribute_type(&self, name: &str) -> AttributeType {
        self.attributes.get(name).copied().unwrap_or_default()
    }

    /// Hierarchy registered for an attribute.
    pub fn hierarchy(&self, name: &str) -> Option<&Hierarchy> {
        self.hierarchies.get(name)
    }

    /// Declared attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, AttributeType)> {
        self.attributes.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Roles of the given columns, in column order.
    pub fn roles_for(&self, headers: &[String]) -> Vec<AttributeType> {
        headers.iter().map(|h| self.attribute_type(h)).collect()
    }

    /// Names among `headers` with the given role, in column order.
    pub fn columns_of<'a>(&self, headers: &'a [String], role: AttributeType) -> Vec<&'a str> {
        headers
            .iter()
            .filter(|h| self.attribute_type(h) == role)
            .map(String::as_str)
            .collect()
    }

    /// Reject declarations that name columns the table does not have.
    pub fn check_columns(&self, headers: &[String]) -> Result<()> {
        let declared = self.attributes.keys().chain(self.hierarchies.keys());
        for name in declared {
            if !headers.iter().any(|h| h == name) {
                return Err(ShroudError::config(
                    name.as_str(),
                    "attribute is not a column of the dataset",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        vec!["age".into(), "gender".into(), "zipcode".into(), "name".into()]
    }

    fn gender() -> Hierarchy {
        Hierarchy::builder()
            .add(["male", "*"])
            .add(["female", "*"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_undeclared_attribute_is_insensitive() {
        let definition = DataDefinition::new();
        assert_eq!(definition.attribute_type("age"), AttributeType::Insensitive);
    }

    #[test]
    fn test_set_hierarchy_marks_quasi_identifier() {
        let definition = DataDefinition::new().with_hierarchy("gender", gender());
        assert_eq!(
            definition.attribute_type("gender"),
            AttributeType::QuasiIdentifying
        );
        assert_eq!(definition.hierarchy("gender").map(|h| h.height()), Some(2));
    }

    #[test]
    fn test_role_can_be_overridden() {
        let mut definition = DataDefinition::new();
        definition
            .set_hierarchy("gender", gender())
            .set_attribute_type("gender", AttributeType::Sensitive);
        assert_eq!(definition.attribute_type("gender"), AttributeType::Sensitive);
    }

    #[test]
    fn test_columns_of_role() {
        let definition = DataDefinition::new()
            .with_hierarchy("gender", gender())
            .with_attribute("name", AttributeType::Identifying)
            .with_attribute("age", AttributeType::Sensitive);
        let headers = headers();
        assert_eq!(
            definition.columns_of(&headers, AttributeType::QuasiIdentifying),
            vec!["gender"]
        );
        assert_eq!(
            definition.columns_of(&headers, AttributeType::Insensitive),
            vec!["zipcode"]
        );
        assert_eq!(
            definition.roles_for(&headers),
            vec![
                AttributeType::Sensitive,
                AttributeType::QuasiIdentifying,
                AttributeType::Insensitive,
                AttributeType::Identifying,
            ]
        );
    }

    #[test]
    fn test_unknown_column_rejected() {
        let definition = DataDefinition::new().with_attribute("salary", AttributeType::Sensitive);
        let err = definition.check_columns(&headers()).unwrap_err();
        assert!(matches!(err, ShroudError::Configuration { ref subject, .. } if subject == "salary"));
    }
}
