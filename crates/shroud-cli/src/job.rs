//! Job files: attribute roles, hierarchy files and anonymization options.
//!
//! ```json
//! {
//!   "attributes": {
//!     "name": { "type": "identifying" },
//!     "age": { "hierarchy": "hierarchies/age.csv" },
//!     "disease": { "type": "sensitive" }
//!   },
//!   "config": {
//!     "criteria": [{ "type": "k_anonymity", "k": 5 }],
//!     "allowed_outlier_fraction": 0.02
//!   }
//! }
//! ```
//!
//! Hierarchy paths are resolved against the job file's directory.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use shroud::{AnonymizationConfig, AttributeType, DataDefinition, Parser};
use tracing::debug;

/// One attribute's declaration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    /// Role; defaults to quasi-identifying when a hierarchy is given.
    #[serde(rename = "type", default)]
    pub role: Option<AttributeType>,
    /// Hierarchy table for a quasi-identifier.
    #[serde(default)]
    pub hierarchy: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeSpec>,
    #[serde(default)]
    pub config: AnonymizationConfig,
}

impl Job {
    /// Read a job file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        if !path.exists() {
            return Err(format!("Job file not found: {}", path.display()).into());
        }
        let contents = fs::read_to_string(path)?;
        let job = serde_json::from_str(&contents)
            .map_err(|e| format!("Invalid job file {}: {}", path.display(), e))?;
        Ok(job)
    }

    /// Build the data definition, loading hierarchies relative to `job_path`.
    pub fn definition(&self, job_path: &Path) -> Result<DataDefinition, Box<dyn Error>> {
        let base = job_path.parent().unwrap_or_else(|| Path::new("."));
        let parser = Parser::new();
        let mut definition = DataDefinition::new();

        for (name, spec) in &self.attributes {
            match (&spec.hierarchy, spec.role) {
                (Some(path), None | Some(AttributeType::QuasiIdentifying)) => {
                    let path = base.join(path);
                    debug!(attribute = %name, path = %path.display(), "Loading hierarchy");
                    let hierarchy = parser.parse_hierarchy_file(&path, name)?;
                    definition.set_hierarchy(name.as_str(), hierarchy);
                }
                (Some(_), Some(role)) => {
                    return Err(format!(
                        "Attribute '{}' is {} but declares a hierarchy; only quasi-identifiers take one",
                        name, role
                    )
                    .into());
                }
                (None, Some(role)) => {
                    definition.set_attribute_type(name.as_str(), role);
                }
                (None, None) => {
                    return Err(format!("Attribute '{}' needs a type or a hierarchy", name).into());
                }
            }
        }

        Ok(definition)
    }
}
