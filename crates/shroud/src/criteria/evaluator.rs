//! Criteria prepared against a dataset and evaluated on equivalence classes.

use crate::classes::{ClassRequirements, EquivalenceClass, EquivalenceClasses, FrequencyTable};
use crate::dataset::DatasetView;
use crate::error::{Result, ShroudError};

use super::closeness::{SensitiveTree, equal_distance};
use super::criterion::PrivacyCriterion;

const ENTROPY_TOLERANCE: f64 = 1e-10;
const DISTANCE_TOLERANCE: f64 = 1e-9;

/// Number of records that may be suppressed as outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionBudget {
    allowed: usize,
}

impl SuppressionBudget {
    /// `⌊fraction · rows⌋` records. The fraction must already be validated.
    pub fn from_fraction(fraction: f64, rows: usize) -> Self {
        let allowed = (fraction * rows as f64).floor() as usize;
        Self {
            allowed: allowed.min(rows),
        }
    }

    /// An explicit record count.
    pub fn records(allowed: usize) -> Self {
        Self { allowed }
    }

    /// Maximum number of outlier records.
    pub fn allowed(&self) -> usize {
        self.allowed
    }

    /// Returns true if `records` outliers fit.
    pub fn admits(&self, records: usize) -> bool {
        records <= self.allowed
    }
}

/// Outcome of one criterion on one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Satisfied after suppressing `outliers` records.
    Satisfied { outliers: usize },
    /// `records` records violate the criterion, more than the budget allows.
    Violated { records: usize },
}

impl Verdict {
    /// Returns true for [`Verdict::Satisfied`].
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Verdict::Satisfied { .. })
    }
}

/// A criterion bound to the dataset it runs on.
#[derive(Debug, Clone)]
pub enum PreparedCriterion {
    KAnonymity {
        k: usize,
    },
    DistinctLDiversity {
        l: usize,
    },
    EntropyLDiversity {
        threshold: f64,
    },
    RecursiveCLDiversity {
        c: f64,
        l: usize,
    },
    EqualDistanceTCloseness {
        t: f64,
        global: Vec<f64>,
    },
    HierarchicalDistanceTCloseness {
        t: f64,
        global: Vec<f64>,
        tree: SensitiveTree,
    },
}

impl PreparedCriterion {
    /// Bind `criterion` to `view`, resolving global distributions.
    pub fn prepare(criterion: &PrivacyCriterion, view: &DatasetView) -> Result<Self> {
        criterion.validate()?;
        let sensitive = || {
            view.sensitive().ok_or_else(|| {
                ShroudError::config(
                    criterion.name(),
                    "requires exactly one sensitive attribute",
                )
            })
        };
        Ok(match criterion {
            PrivacyCriterion::KAnonymity { k } => PreparedCriterion::KAnonymity { k: *k },
            PrivacyCriterion::DistinctLDiversity { l } => {
                sensitive()?;
                PreparedCriterion::DistinctLDiversity { l: *l }
            }
            PrivacyCriterion::EntropyLDiversity { l } => {
                sensitive()?;
                PreparedCriterion::EntropyLDiversity { threshold: l.ln() }
            }
            PrivacyCriterion::RecursiveCLDiversity { c, l } => {
                sensitive()?;
                PreparedCriterion::RecursiveCLDiversity { c: *c, l: *l }
            }
            PrivacyCriterion::EqualDistanceTCloseness { t } => {
                PreparedCriterion::EqualDistanceTCloseness {
                    t: *t,
                    global: sensitive()?.distribution(),
                }
            }
            PrivacyCriterion::HierarchicalDistanceTCloseness { t, hierarchy } => {
                let attribute = sensitive()?;
                PreparedCriterion::HierarchicalDistanceTCloseness {
                    t: *t,
                    global: attribute.distribution(),
                    tree: SensitiveTree::build(hierarchy, attribute)?,
                }
            }
        })
    }

    /// Returns true if the class needs sensitive frequencies.
    pub fn requires_sensitive(&self) -> bool {
        !matches!(self, PreparedCriterion::KAnonymity { .. })
    }

    /// Returns true if `class` meets the criterion.
    pub fn accepts(&self, class: &EquivalenceClass) -> bool {
        match self {
            PreparedCriterion::KAnonymity { k } => class.size() >= *k,
            _ => class
                .sensitive()
                .is_some_and(|frequencies| self.accepts_frequencies(frequencies)),
        }
    }

    fn accepts_frequencies(&self, frequencies: &FrequencyTable) -> bool {
        match self {
            PreparedCriterion::KAnonymity { .. } => true,
            PreparedCriterion::DistinctLDiversity { l } => frequencies.distinct() >= *l,
            PreparedCriterion::EntropyLDiversity { threshold } => {
                frequencies.entropy() + ENTROPY_TOLERANCE >= *threshold
            }
            PreparedCriterion::RecursiveCLDiversity { c, l } => {
                let counts = frequencies.counts_descending();
                if counts.len() < *l {
                    return false;
                }
                let tail: usize = counts[*l - 1..].iter().sum();
                counts[0] as f64 <= c * tail as f64
            }
            PreparedCriterion::EqualDistanceTCloseness { t, global } => {
                equal_distance(frequencies, global) <= t + DISTANCE_TOLERANCE
            }
            PreparedCriterion::HierarchicalDistanceTCloseness { t, global, tree } => {
                tree.distance(frequencies, global) <= t + DISTANCE_TOLERANCE
            }
        }
    }

    /// Evaluate this criterion alone on a node's classes.
    pub fn evaluate(&self, classes: &EquivalenceClasses, budget: SuppressionBudget) -> Verdict {
        let records = classes
            .iter()
            .filter(|class| !self.accepts(class))
            .map(EquivalenceClass::size)
            .sum();
        if budget.admits(records) {
            Verdict::Satisfied { outliers: records }
        } else {
            Verdict::Violated { records }
        }
    }
}

/// Combined outcome of all criteria on one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    /// True if the outlier records fit the budget.
    pub anonymous: bool,
    /// Records in classes failing at least one criterion.
    pub outlier_records: usize,
    /// `outlier_classes[id]` is true for classes failing any criterion.
    pub outlier_classes: Vec<bool>,
}

/// The conjunction of all configured criteria sharing one outlier budget.
#[derive(Debug, Clone)]
pub struct CriterionSet {
    criteria: Vec<PreparedCriterion>,
    budget: SuppressionBudget,
}

impl CriterionSet {
    /// Prepare every criterion against `view`.
    pub fn prepare(
        criteria: &[PrivacyCriterion],
        view: &DatasetView,
        budget: SuppressionBudget,
    ) -> Result<Self> {
        if criteria.is_empty() {
            return Err(ShroudError::config(
                "criteria",
                "at least one privacy criterion is required",
            ));
        }
        let criteria = criteria
            .iter()
            .map(|criterion| PreparedCriterion::prepare(criterion, view))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { criteria, budget })
    }

    /// The shared outlier budget.
    pub fn budget(&self) -> SuppressionBudget {
        self.budget
    }

    /// Prepared criteria in configuration order.
    pub fn criteria(&self) -> &[PreparedCriterion] {
        &self.criteria
    }

    /// Statistics the class analyzer must compute for these criteria.
    pub fn requirements(&self) -> ClassRequirements {
        ClassRequirements {
            sensitive_frequencies: self.criteria.iter().any(PreparedCriterion::requires_sensitive),
            row_assignment: false,
        }
    }

    /// Mark failing classes and check the union of outliers against the budget.
    pub fn assess(&self, classes: &EquivalenceClasses) -> Assessment {
        let mut outlier_records = 0;
        let outlier_classes = classes
            .iter()
            .map(|class| {
                let fails = self.criteria.iter().any(|c| !c.accepts(class));
                if fails {
                    outlier_records += class.size();
                }
                fails
            })
            .collect();
        Assessment {
            anonymous: self.budget.admits(outlier_records),
            outlier_records,
            outlier_classes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classes::ClassAnalyzer;
    use crate::hierarchy::Hierarchy;
    use crate::input::DataTable;
    use crate::lattice::Lattice;
    use crate::schema::{AttributeType, DataDefinition};

    fn view(rows: Vec<Vec<&str>>) -> DatasetView {
        let table = DataTable::from_records(["group", "disease"], rows).unwrap();
        let group = Hierarchy::builder()
            .add(["a", "*"])
            .add(["b", "*"])
            .add(["c", "*"])
            .build()
            .unwrap();
        let definition = DataDefinition::new()
            .with_hierarchy("group", group)
            .with_attribute("disease", AttributeType::Sensitive);
        DatasetView::new(&table, &definition).unwrap()
    }

    fn bottom_classes(view: &DatasetView) -> EquivalenceClasses {
        let lattice = Lattice::new(&view.heights()).unwrap();
        ClassAnalyzer::new(view, &lattice).analyze(
            lattice.bottom(),
            ClassRequirements {
                sensitive_frequencies: true,
                row_assignment: false,
            },
        )
    }

    #[test]
    fn test_budget_floor() {
        assert_eq!(SuppressionBudget::from_fraction(0.1, 9).allowed(), 0);
        assert_eq!(SuppressionBudget::from_fraction(0.25, 9).allowed(), 2);
        assert_eq!(SuppressionBudget::from_fraction(1.0, 9).allowed(), 9);
        assert!(SuppressionBudget::records(2).admits(2));
        assert!(!SuppressionBudget::records(2).admits(3));
    }

    #[test]
    fn test_k_anonymity_verdicts() {
        let view = view(vec![
            vec!["a", "flu"],
            vec!["a", "cold"],
            vec!["b", "flu"],
            vec!["c", "flu"],
            vec!["c", "flu"],
        ]);
        let classes = bottom_classes(&view);
        let k2 = PreparedCriterion::prepare(&PrivacyCriterion::k_anonymity(2), &view).unwrap();

        assert_eq!(
            k2.evaluate(&classes, SuppressionBudget::records(0)),
            Verdict::Violated { records: 1 }
        );
        assert_eq!(
            k2.evaluate(&classes, SuppressionBudget::records(1)),
            Verdict::Satisfied { outliers: 1 }
        );
    }

    #[test]
    fn test_diversity_rules() {
        let view = view(vec![
            vec!["a", "flu"],
            vec!["a", "cold"],
            vec!["a", "flu"],
            vec!["b", "flu"],
            vec!["b", "flu"],
            vec!["c", "flu"],
            vec!["c", "cold"],
            vec!["c", "cough"],
        ]);
        let classes = bottom_classes(&view);
        let accepted = |criterion: PrivacyCriterion| -> Vec<bool> {
            let prepared = PreparedCriterion::prepare(&criterion, &view).unwrap();
            classes.iter().map(|class| prepared.accepts(class)).collect()
        };

        assert_eq!(
            accepted(PrivacyCriterion::distinct_l_diversity(2)),
            vec![true, false, true]
        );
        // entropy of {2, 1} is below ln 2, uniform {1, 1, 1} reaches ln 3
        assert_eq!(
            accepted(PrivacyCriterion::entropy_l_diversity(2.0)),
            vec![false, false, true]
        );
        assert_eq!(
            accepted(PrivacyCriterion::entropy_l_diversity(3.0)),
            vec![false, false, true]
        );
        // {2, 1}: 2 <= c * 1 holds for c = 2 but not for c = 1.5
        assert_eq!(
            accepted(PrivacyCriterion::recursive_cl_diversity(2.0, 2)),
            vec![true, false, true]
        );
        assert_eq!(
            accepted(PrivacyCriterion::recursive_cl_diversity(1.5, 2)),
            vec![false, false, true]
        );
    }

    #[test]
    fn test_outliers_counted_once_across_criteria() {
        let view = view(vec![
            vec!["a", "flu"],
            vec!["b", "flu"],
            vec!["b", "flu"],
            vec!["c", "flu"],
            vec!["c", "cold"],
        ]);
        let classes = bottom_classes(&view);
        let set = CriterionSet::prepare(
            &[
                PrivacyCriterion::k_anonymity(2),
                PrivacyCriterion::distinct_l_diversity(2),
            ],
            &view,
            SuppressionBudget::records(3),
        )
        .unwrap();

        let assessment = set.assess(&classes);
        assert_eq!(assessment.outlier_classes, vec![true, true, false]);
        assert_eq!(assessment.outlier_records, 3);
        assert!(assessment.anonymous);
        assert!(set.requirements().sensitive_frequencies);
    }

    #[test]
    fn test_sensitive_criterion_without_sensitive_attribute() {
        let table = DataTable::from_records(["group"], vec![vec!["a"], vec!["b"]]).unwrap();
        let definition = DataDefinition::new().with_hierarchy(
            "group",
            Hierarchy::builder().add(["a", "*"]).add(["b", "*"]).build().unwrap(),
        );
        let view = DatasetView::new(&table, &definition).unwrap();

        let error = CriterionSet::prepare(
            &[PrivacyCriterion::distinct_l_diversity(2)],
            &view,
            SuppressionBudget::records(0),
        )
        .unwrap_err();
        assert!(error.is_configuration());

        let set = CriterionSet::prepare(
            &[PrivacyCriterion::k_anonymity(2)],
            &view,
            SuppressionBudget::records(0),
        )
        .unwrap();
        assert!(!set.requirements().sensitive_frequencies);
        assert!(CriterionSet::prepare(&[], &view, SuppressionBudget::records(0)).is_err());
    }
}
