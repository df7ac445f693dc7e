//! Attribute roles.

use serde::{Deserialize, Serialize};

/// Role of an attribute in the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    /// Directly identifies a person (e.g., name, SSN). Masked in the output.
    Identifying,
    /// Identifies in combination with others (e.g., zipcode, age). Generalized.
    QuasiIdentifying,
    /// Value to protect (e.g., diagnosis). Released as-is, subject to criteria.
    Sensitive,
    /// Released as-is without protection.
    Insensitive,
}

impl AttributeType {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            AttributeType::Identifying => "identifying",
            AttributeType::QuasiIdentifying => "quasi-identifying",
            AttributeType::Sensitive => "sensitive",
            AttributeType::Insensitive => "insensitive",
        }
    }

    /// Returns true if the column appears unmasked in the output.
    pub fn is_released(&self) -> bool {
        !matches!(self, AttributeType::Identifying)
    }
}

impl Default for AttributeType {
    fn default() -> Self {
        AttributeType::Insensitive
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
