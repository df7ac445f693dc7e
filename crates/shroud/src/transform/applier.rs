//! Rewrites a table according to a chosen transformation.

use tracing::debug;

use crate::classes::{ClassAnalyzer, ClassRequirements};
use crate::criteria::CriterionSet;
use crate::dataset::DatasetView;
use crate::error::{Result, ShroudError};
use crate::input::DataTable;
use crate::lattice::{Lattice, NodeId};
use crate::schema::AttributeType;

use super::operations::{ColumnChange, ColumnOperation, TransformSummary};

/// Produces the released table for one lattice node.
///
/// Records in classes failing any criterion are suppressed: their
/// quasi-identifying cells carry the suppression marker. Identifying cells
/// are always masked. Sensitive and insensitive cells are copied. Row order
/// is preserved and the input is never modified.
#[derive(Debug, Clone, Copy)]
pub struct TransformationApplier<'a> {
    view: &'a DatasetView,
    lattice: &'a Lattice,
    criteria: &'a CriterionSet,
    marker: &'a str,
}

impl<'a> TransformationApplier<'a> {
    pub fn new(
        view: &'a DatasetView,
        lattice: &'a Lattice,
        criteria: &'a CriterionSet,
        marker: &'a str,
    ) -> Self {
        Self {
            view,
            lattice,
            criteria,
            marker,
        }
    }

    /// Build the released table for `node`.
    pub fn apply(&self, table: &DataTable, node: NodeId) -> Result<(DataTable, TransformSummary)> {
        if table.headers != self.view.headers() || table.row_count() != self.view.row_count() {
            return Err(ShroudError::config(
                "table",
                "does not match the data the anonymizer was prepared for",
            ));
        }

        let requirements = ClassRequirements {
            row_assignment: true,
            ..self.criteria.requirements()
        };
        let classes = ClassAnalyzer::new(self.view, self.lattice).analyze(node, requirements);
        let assessment = self.criteria.assess(&classes);

        let suppressed: Vec<bool> = (0..table.row_count())
            .map(|row| {
                classes
                    .class_of(row)
                    .is_some_and(|class| assessment.outlier_classes[class])
            })
            .collect();

        let operations = self.operations(node);
        let mut rows = table.rows.clone();
        let mut changes = Vec::with_capacity(operations.len());
        for (column, operation) in operations.into_iter().enumerate() {
            let mut values_changed = 0;
            match &operation {
                ColumnOperation::Retain { .. } => {}
                ColumnOperation::Mask { .. } => {
                    for row in rows.iter_mut() {
                        values_changed += replace(&mut row[column], self.marker);
                    }
                }
                ColumnOperation::Generalize { level, .. } => {
                    let qi = self
                        .view
                        .quasi_identifiers()
                        .iter()
                        .find(|qi| qi.column() == column)
                        .ok_or_else(|| {
                            ShroudError::config(operation.column(), "not a quasi-identifier")
                        })?;
                    for (index, row) in rows.iter_mut().enumerate() {
                        let value = if suppressed[index] {
                            self.marker
                        } else {
                            qi.generalized(index, *level)
                        };
                        values_changed += replace(&mut row[column], value);
                    }
                }
            }
            changes.push(ColumnChange {
                operation,
                values_changed,
            });
        }

        let suppressed_rows: Vec<usize> = suppressed
            .iter()
            .enumerate()
            .filter_map(|(row, &s)| s.then_some(row))
            .collect();
        debug!(
            transformation = %self.lattice.transformation(node),
            suppressed = suppressed_rows.len(),
            "Applied transformation"
        );

        let output = DataTable::new(table.headers.clone(), rows, table.delimiter);
        Ok((
            output,
            TransformSummary {
                suppressed_rows,
                changes,
            },
        ))
    }

    /// Operation for every column at `node`.
    pub fn operations(&self, node: NodeId) -> Vec<ColumnOperation> {
        let mut dimension = 0;
        self.view
            .headers()
            .iter()
            .zip(self.view.roles())
            .map(|(name, role)| {
                let column = name.clone();
                match role {
                    AttributeType::QuasiIdentifying => {
                        let level = self.lattice.level(node, dimension);
                        dimension += 1;
                        ColumnOperation::Generalize { column, level }
                    }
                    AttributeType::Identifying => ColumnOperation::Mask { column },
                    AttributeType::Sensitive | AttributeType::Insensitive => {
                        ColumnOperation::Retain { column }
                    }
                }
            })
            .collect()
    }
}

fn replace(cell: &mut String, value: &str) -> usize {
    if cell == value {
        return 0;
    }
    cell.clear();
    cell.push_str(value);
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{PrivacyCriterion, SuppressionBudget};
    use crate::hierarchy::Hierarchy;
    use crate::schema::DataDefinition;

    fn fixture() -> (DataTable, DatasetView) {
        let table = DataTable::from_records(
            ["name", "age", "disease"],
            vec![
                vec!["Ann", "34", "flu"],
                vec!["Bob", "38", "cold"],
                vec!["Cid", "61", "flu"],
            ],
        )
        .unwrap();
        let age = Hierarchy::builder()
            .add(["34", "30-39", "*"])
            .add(["38", "30-39", "*"])
            .add(["61", "60-69", "*"])
            .build()
            .unwrap();
        let definition = DataDefinition::new()
            .with_attribute("name", AttributeType::Identifying)
            .with_hierarchy("age", age)
            .with_attribute("disease", AttributeType::Sensitive);
        let view = DatasetView::new(&table, &definition).unwrap();
        (table, view)
    }

    #[test]
    fn test_apply_generalizes_masks_and_suppresses() {
        let (table, view) = fixture();
        let lattice = Lattice::new(&view.heights()).unwrap();
        let criteria = CriterionSet::prepare(
            &[PrivacyCriterion::k_anonymity(2)],
            &view,
            SuppressionBudget::records(1),
        )
        .unwrap();
        let applier = TransformationApplier::new(&view, &lattice, &criteria, "*");
        let node = lattice.node(&[1]).unwrap();

        let (output, summary) = applier.apply(&table, node).unwrap();
        assert_eq!(output.headers, table.headers);
        assert_eq!(output.rows[0], vec!["*", "30-39", "flu"]);
        assert_eq!(output.rows[1], vec!["*", "30-39", "cold"]);
        assert_eq!(output.rows[2], vec!["*", "*", "flu"]);
        assert_eq!(summary.suppressed_rows, vec![2]);
        assert_eq!(summary.changes[0].values_changed, 3);
        assert_eq!(summary.changes[1].values_changed, 3);
        assert_eq!(summary.changes[2].values_changed, 0);
        assert_eq!(summary.cells_changed(), 6);
        // input untouched
        assert_eq!(table.get(2, 1), Some("61"));
    }

    #[test]
    fn test_apply_twice_is_identical() {
        let (table, view) = fixture();
        let lattice = Lattice::new(&view.heights()).unwrap();
        let criteria = CriterionSet::prepare(
            &[PrivacyCriterion::k_anonymity(2)],
            &view,
            SuppressionBudget::records(1),
        )
        .unwrap();
        let applier = TransformationApplier::new(&view, &lattice, &criteria, "*");
        let node = lattice.node(&[1]).unwrap();

        let first = applier.apply(&table, node).unwrap();
        let second = applier.apply(&table, node).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_operations_follow_roles() {
        let (_, view) = fixture();
        let lattice = Lattice::new(&view.heights()).unwrap();
        let criteria = CriterionSet::prepare(
            &[PrivacyCriterion::k_anonymity(1)],
            &view,
            SuppressionBudget::records(0),
        )
        .unwrap();
        let applier = TransformationApplier::new(&view, &lattice, &criteria, "*");
        let operations = applier.operations(lattice.top());
        assert_eq!(
            operations,
            vec![
                ColumnOperation::Mask {
                    column: "name".to_string()
                },
                ColumnOperation::Generalize {
                    column: "age".to_string(),
                    level: 2
                },
                ColumnOperation::Retain {
                    column: "disease".to_string()
                },
            ]
        );
        assert_eq!(operations[1].description(), "Generalize 'age' to level 2");
    }

    #[test]
    fn test_rejects_foreign_table() {
        let (_, view) = fixture();
        let lattice = Lattice::new(&view.heights()).unwrap();
        let criteria = CriterionSet::prepare(
            &[PrivacyCriterion::k_anonymity(1)],
            &view,
            SuppressionBudget::records(0),
        )
        .unwrap();
        let other = DataTable::from_records(["age"], vec![vec!["34"]]).unwrap();
        let applier = TransformationApplier::new(&view, &lattice, &criteria, "*");
        assert!(applier.apply(&other, lattice.bottom()).is_err());
    }
}
