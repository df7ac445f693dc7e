//! Encoded projection of a table onto the columns the engine works with.

use tracing::warn;

use crate::error::{Result, ShroudError};
use crate::hierarchy::HierarchyError;
use crate::input::DataTable;
use crate::schema::{AttributeType, DataDefinition};

use super::dictionary::Dictionary;

/// A quasi-identifying column with its hierarchy pre-resolved to codes.
#[derive(Debug, Clone)]
pub struct QuasiIdentifier {
    name: String,
    column: usize,
    /// Raw value code of each row.
    raw_codes: Vec<u32>,
    /// `generalization[level][raw_code]` is the code of the representative
    /// in `levels[level]`.
    generalization: Vec<Vec<u32>>,
    levels: Vec<Dictionary>,
}

impl QuasiIdentifier {
    fn build(
        name: &str,
        column: usize,
        table: &DataTable,
        definition: &DataDefinition,
    ) -> Result<Self> {
        let hierarchy = definition.hierarchy(name).ok_or_else(|| {
            ShroudError::config(name, "quasi-identifying attribute has no hierarchy")
        })?;
        let height = hierarchy.height();

        let mut raw = Dictionary::new();
        let raw_codes: Vec<u32> = table.column_values(column).map(|v| raw.intern(v)).collect();

        let mut levels = vec![Dictionary::new(); height];
        let mut generalization = vec![Vec::with_capacity(raw.len()); height];
        for value in raw.iter() {
            let row = hierarchy.row(value).ok_or_else(|| {
                ShroudError::hierarchy(
                    name,
                    HierarchyError::MissingValue {
                        value: value.to_string(),
                    },
                )
            })?;
            for (level, representative) in row.iter().enumerate() {
                generalization[level].push(levels[level].intern(representative));
            }
        }

        if height == 1 {
            warn!(attribute = name, "Quasi-identifier has a hierarchy of height one");
        }

        Ok(Self {
            name: name.to_string(),
            column,
            raw_codes,
            generalization,
            levels,
        })
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column position in the source table.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Hierarchy height.
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Code of row `row`'s representative at `level`.
    pub fn code_at(&self, row: usize, level: usize) -> u32 {
        self.generalization[level][self.raw_codes[row] as usize]
    }

    /// Representative of row `row` at `level`.
    pub fn generalized(&self, row: usize, level: usize) -> &str {
        self.levels[level].value(self.code_at(row, level))
    }

    /// Raw-code → representative-code table for one level.
    pub fn level_table(&self, level: usize) -> &[u32] {
        &self.generalization[level]
    }

    /// Raw code of every row.
    pub fn raw_codes(&self) -> &[u32] {
        &self.raw_codes
    }

    /// Number of distinct representatives occurring in the data at `level`.
    pub fn distinct_at(&self, level: usize) -> usize {
        self.levels[level].len()
    }
}

/// The sensitive column with dataset-wide value counts.
#[derive(Debug, Clone)]
pub struct SensitiveAttribute {
    name: String,
    column: usize,
    codes: Vec<u32>,
    dictionary: Dictionary,
    counts: Vec<usize>,
}

impl SensitiveAttribute {
    fn build(name: &str, column: usize, table: &DataTable) -> Self {
        let mut dictionary = Dictionary::new();
        let codes: Vec<u32> = table
            .column_values(column)
            .map(|v| dictionary.intern(v))
            .collect();
        let mut counts = vec![0; dictionary.len()];
        for &code in &codes {
            counts[code as usize] += 1;
        }
        Self {
            name: name.to_string(),
            column,
            codes,
            dictionary,
            counts,
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column position in the source table.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Value code of every row.
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Distinct sensitive values.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Dataset-wide count of each value code.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Dataset-wide relative frequency of each value code.
    pub fn distribution(&self) -> Vec<f64> {
        let total = self.codes.len() as f64;
        if total == 0.0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts.iter().map(|&c| c as f64 / total).collect()
    }
}

/// Immutable, encoded view of the columns relevant to anonymization.
///
/// Identifying columns are not part of the view. The sensitive attribute is
/// only encoded when exactly one column is marked sensitive.
#[derive(Debug, Clone)]
pub struct DatasetView {
    headers: Vec<String>,
    roles: Vec<AttributeType>,
    row_count: usize,
    quasi_identifiers: Vec<QuasiIdentifier>,
    sensitive: Option<SensitiveAttribute>,
}

impl DatasetView {
    /// Encode `table` according to `definition`.
    ///
    /// Fails if the definition names unknown columns, a quasi-identifier has
    /// no hierarchy, or a value is not covered by its hierarchy.
    pub fn new(table: &DataTable, definition: &DataDefinition) -> Result<Self> {
        definition.check_columns(&table.headers)?;
        let roles = definition.roles_for(&table.headers);

        let mut quasi_identifiers = Vec::new();
        let mut sensitive_columns = Vec::new();
        for (column, (name, role)) in table.headers.iter().zip(&roles).enumerate() {
            match role {
                AttributeType::QuasiIdentifying => {
                    quasi_identifiers.push(QuasiIdentifier::build(name, column, table, definition)?);
                }
                AttributeType::Sensitive => sensitive_columns.push((name, column)),
                AttributeType::Identifying | AttributeType::Insensitive => {}
            }
        }

        let sensitive = match sensitive_columns.as_slice() {
            [(name, column)] => Some(SensitiveAttribute::build(name, *column, table)),
            _ => None,
        };

        Ok(Self {
            headers: table.headers.clone(),
            roles,
            row_count: table.row_count(),
            quasi_identifiers,
            sensitive,
        })
    }

    /// Column headers of the source table.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Role of every source column.
    pub fn roles(&self) -> &[AttributeType] {
        &self.roles
    }

    /// Number of records.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Quasi-identifiers in column order; lattice dimensions follow this order.
    pub fn quasi_identifiers(&self) -> &[QuasiIdentifier] {
        &self.quasi_identifiers
    }

    /// Hierarchy height of each quasi-identifier.
    pub fn heights(&self) -> Vec<usize> {
        self.quasi_identifiers.iter().map(|q| q.height()).collect()
    }

    /// The single sensitive attribute, if exactly one is defined.
    pub fn sensitive(&self) -> Option<&SensitiveAttribute> {
        self.sensitive.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Hierarchy;

    fn table() -> DataTable {
        DataTable::from_records(
            ["name", "age", "zipcode", "disease"],
            vec![
                vec!["ann", "29", "47677", "flu"],
                vec!["bob", "43", "47602", "gastritis"],
                vec!["cid", "29", "47678", "flu"],
            ],
        )
        .unwrap()
    }

    fn definition() -> DataDefinition {
        let age = Hierarchy::builder()
            .add(["29", "<=40", "*"])
            .add(["43", ">40", "*"])
            .build()
            .unwrap();
        let zipcode = Hierarchy::builder()
            .add(["47677", "4767*", "*****"])
            .add(["47678", "4767*", "*****"])
            .add(["47602", "4760*", "*****"])
            .build()
            .unwrap();
        DataDefinition::new()
            .with_attribute("name", AttributeType::Identifying)
            .with_hierarchy("age", age)
            .with_hierarchy("zipcode", zipcode)
            .with_attribute("disease", AttributeType::Sensitive)
    }

    #[test]
    fn test_view_encodes_quasi_identifiers() {
        let view = DatasetView::new(&table(), &definition()).unwrap();
        assert_eq!(view.row_count(), 3);
        assert_eq!(view.heights(), vec![3, 3]);

        let zip = &view.quasi_identifiers()[1];
        assert_eq!(zip.name(), "zipcode");
        assert_eq!(zip.column(), 2);
        assert_eq!(zip.distinct_at(0), 3);
        assert_eq!(zip.distinct_at(1), 2);
        assert_eq!(zip.code_at(0, 1), zip.code_at(2, 1));
        assert_ne!(zip.code_at(0, 1), zip.code_at(1, 1));
        assert_eq!(zip.generalized(1, 1), "4760*");
    }

    #[test]
    fn test_view_encodes_sensitive_distribution() {
        let view = DatasetView::new(&table(), &definition()).unwrap();
        let sensitive = view.sensitive().unwrap();
        assert_eq!(sensitive.name(), "disease");
        assert_eq!(sensitive.counts(), &[2, 1]);
        let distribution = sensitive.distribution();
        assert!((distribution[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_hierarchy_is_configuration_error() {
        let definition = definition().with_attribute("name", AttributeType::QuasiIdentifying);
        let err = DatasetView::new(&table(), &definition).unwrap_err();
        assert!(matches!(err, ShroudError::Configuration { ref subject, .. } if subject == "name"));
    }

    #[test]
    fn test_uncovered_value_is_hierarchy_error() {
        let age = Hierarchy::builder().add(["29", "*"]).build().unwrap();
        let definition = definition().with_hierarchy("age", age);
        let err = DatasetView::new(&table(), &definition).unwrap_err();
        match err {
            ShroudError::InvalidHierarchy { attribute, source } => {
                assert_eq!(attribute, "age");
                assert_eq!(
                    source,
                    HierarchyError::MissingValue {
                        value: "43".to_string()
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
