//! The hierarchy table: one row per raw value, one column per level.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::HierarchyError;

/// A validated generalization hierarchy.
///
/// Each row starts with a raw value (level 0) followed by increasingly
/// general representatives. All rows have the same length, the hierarchy's
/// height. Values that share a representative at some level share it at
/// every higher level.
///
/// # Example
///
/// ```
/// use shroud::Hierarchy;
///
/// let age = Hierarchy::builder()
///     .add(["29", "<=40", "*"])
///     .add(["43", ">40", "*"])
///     .build()
///     .unwrap();
///
/// assert_eq!(age.height(), 3);
/// assert_eq!(age.generalize("43", 1), Some(">40"));
/// assert_eq!(age.generalize("43", 2), Some("*"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct Hierarchy {
    rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
    height: usize,
}

impl Hierarchy {
    /// Start building a hierarchy row by row.
    pub fn builder() -> HierarchyBuilder {
        HierarchyBuilder::default()
    }

    /// Validate a table of rows and index it by raw value.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Result<Self, HierarchyError> {
        let first = rows.first().ok_or(HierarchyError::Empty)?;
        let height = first.len();

        let mut index = HashMap::with_capacity(rows.len());
        for (position, row) in rows.iter().enumerate() {
            let value = row
                .first()
                .ok_or(HierarchyError::EmptyRow { row: position })?;
            if row.len() != height {
                return Err(HierarchyError::RaggedRow {
                    value: value.clone(),
                    expected: height,
                    found: row.len(),
                });
            }
            if index.insert(value.clone(), position).is_some() {
                return Err(HierarchyError::DuplicateValue {
                    value: value.clone(),
                });
            }
        }

        check_monotone(&rows, height)?;

        Ok(Self {
            rows,
            index,
            height,
        })
    }

    /// Number of levels, including the raw level 0.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of raw values covered.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the hierarchy covers no values.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Representative of `value` at `level`, or `None` if the value is not
    /// covered or the level is out of range.
    pub fn generalize(&self, value: &str, level: usize) -> Option<&str> {
        self.row(value)
            .and_then(|row| row.get(level))
            .map(String::as_str)
    }

    /// The full generalization row for a raw value.
    pub fn row(&self, value: &str) -> Option<&[String]> {
        self.index.get(value).map(|&i| self.rows[i].as_slice())
    }

    /// Returns true if `value` is a raw value of this hierarchy.
    pub fn contains(&self, value: &str) -> bool {
        self.index.contains_key(value)
    }

    /// Raw values in table order.
    pub fn domain(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row[0].as_str())
    }

    /// Number of distinct representatives at `level`.
    pub fn distinct_at(&self, level: usize) -> usize {
        self.rows
            .iter()
            .filter_map(|row| row.get(level))
            .collect::<HashSet<_>>()
            .len()
    }

    /// All rows in table order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}

impl TryFrom<Vec<Vec<String>>> for Hierarchy {
    type Error = HierarchyError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        Hierarchy::from_rows(rows)
    }
}

impl From<Hierarchy> for Vec<Vec<String>> {
    fn from(hierarchy: Hierarchy) -> Self {
        hierarchy.rows
    }
}

/// Verify that no two values merged at one level are split at the next.
fn check_monotone(rows: &[Vec<String>], height: usize) -> Result<(), HierarchyError> {
    for level in 0..height.saturating_sub(1) {
        let mut parents: HashMap<&str, &str> = HashMap::new();
        for row in rows {
            let child = row[level].as_str();
            let parent = row[level + 1].as_str();
            match parents.entry(child) {
                Entry::Occupied(existing) => {
                    if *existing.get() != parent {
                        return Err(HierarchyError::NonMonotone {
                            level,
                            value: child.to_string(),
                            first: existing.get().to_string(),
                            second: parent.to_string(),
                        });
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(parent);
                }
            }
        }
    }
    Ok(())
}

/// Incremental construction of a [`Hierarchy`].
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    rows: Vec<Vec<String>>,
}

impl HierarchyBuilder {
    /// Append a row: the raw value followed by its representatives.
    pub fn add<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// Validate and build the hierarchy.
    pub fn build(self) -> Result<Hierarchy, HierarchyError> {
        Hierarchy::from_rows(self.rows)
    }
}
