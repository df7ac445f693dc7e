//! Main Anonymizer struct and public API.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::AnonymizationConfig;
use crate::criteria::{CriterionSet, SuppressionBudget};
use crate::dataset::DatasetView;
use crate::error::{Result, ShroudError};
use crate::input::{DataTable, Parser, SourceMetadata};
use crate::lattice::{Lattice, Transformation};
use crate::metric::{InfoLossMetric, InformationLoss, LossModel};
use crate::schema::{AttributeType, DataDefinition};
use crate::search::{SearchEngine, SearchStatistics};
use crate::transform::{TransformSummary, TransformationApplier};

/// Role and hierarchy height of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeSummary {
    pub name: String,
    pub role: AttributeType,
    /// Hierarchy height, for quasi-identifiers.
    pub height: Option<usize>,
}

/// What a run over a table would search, computed without searching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnonymizationPlan {
    /// Attributes in column order.
    pub attributes: Vec<AttributeSummary>,
    /// Number of records.
    pub records: usize,
    /// Number of transformations in the lattice.
    pub lattice_size: usize,
    /// Records that may be suppressed as outliers.
    pub outlier_budget: usize,
}

/// Outcome of an anonymization run.
#[derive(Debug, Clone)]
pub struct AnonymizationResult {
    /// Quasi-identifier names, in the order of the transformation's levels.
    pub quasi_identifiers: Vec<String>,
    /// Winning transformation, if any node satisfies the criteria.
    pub transformation: Option<Transformation>,
    /// Information loss of the winning transformation.
    pub loss: Option<InformationLoss>,
    /// Metric `loss` is measured in.
    pub metric: InfoLossMetric,
    /// True if the transformation is proven to have minimal loss.
    pub optimal: bool,
    /// Number of suppressed records in the output.
    pub suppressed_records: usize,
    /// The released table.
    pub output: Option<DataTable>,
    /// Per-column changes and suppressed row positions.
    pub summary: Option<TransformSummary>,
    /// SHA-256 fingerprint of the released table.
    pub fingerprint: Option<String>,
    /// Search counters.
    pub statistics: SearchStatistics,
}

impl AnonymizationResult {
    /// Returns true if a satisfying transformation was found and applied.
    ///
    /// `false` covers both a proven absence of solutions and a search that
    /// stopped at its limits first; see [`Self::is_proven_unsatisfiable`].
    pub fn is_result_available(&self) -> bool {
        self.output.is_some()
    }

    /// Returns true if the search ran to completion without finding any
    /// transformation that satisfies the criteria.
    ///
    /// A search cut short by `max_evaluations` or `time_limit_ms` may leave
    /// no result without proving anything, in which case this is `false`.
    pub fn is_proven_unsatisfiable(&self) -> bool {
        self.output.is_none() && self.statistics.complete
    }
}

/// Data prepared for one run: encoded view, lattice, criteria, metric.
struct Prepared {
    view: DatasetView,
    lattice: Lattice,
    criteria: CriterionSet,
    model: LossModel,
}

/// The main anonymization engine.
///
/// Inputs are never modified, so one definition and table can be anonymized
/// repeatedly under different configurations.
///
/// # Example
///
/// ```
/// use shroud::{
///     AnonymizationConfig, Anonymizer, AttributeType, DataDefinition, DataTable, Hierarchy,
///     PrivacyCriterion,
/// };
///
/// let table = DataTable::from_records(
///     ["age", "disease"],
///     vec![vec!["34", "flu"], vec!["38", "cold"], vec!["45", "flu"], vec!["47", "cough"]],
/// )
/// .unwrap();
/// let age = Hierarchy::builder()
///     .add(["34", "30-39", "*"])
///     .add(["38", "30-39", "*"])
///     .add(["45", "40-49", "*"])
///     .add(["47", "40-49", "*"])
///     .build()
///     .unwrap();
/// let definition = DataDefinition::new()
///     .with_hierarchy("age", age)
///     .with_attribute("disease", AttributeType::Sensitive);
///
/// let config = AnonymizationConfig::new().with_criterion(PrivacyCriterion::k_anonymity(2));
/// let result = Anonymizer::with_config(config).anonymize(&table, &definition).unwrap();
///
/// assert!(result.is_result_available());
/// assert_eq!(result.transformation.unwrap().levels(), &[1]);
/// assert_eq!(result.output.unwrap().get(0, 0), Some("30-39"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Anonymizer {
    config: AnonymizationConfig,
}

impl Anonymizer {
    /// Create an anonymizer with default configuration (no criteria).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an anonymizer with custom configuration.
    pub fn with_config(config: AnonymizationConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnonymizationConfig {
        &self.config
    }

    /// Validate the definition against `table` and describe the search space.
    pub fn plan(&self, table: &DataTable, definition: &DataDefinition) -> Result<AnonymizationPlan> {
        let prepared = self.prepare(table, definition)?;
        let attributes = prepared
            .view
            .headers()
            .iter()
            .zip(prepared.view.roles())
            .map(|(name, &role)| AttributeSummary {
                name: name.clone(),
                role,
                height: definition
                    .hierarchy(name)
                    .filter(|_| role == AttributeType::QuasiIdentifying)
                    .map(|h| h.height()),
            })
            .collect();
        Ok(AnonymizationPlan {
            attributes,
            records: prepared.view.row_count(),
            lattice_size: prepared.lattice.size(),
            outlier_budget: prepared.criteria.budget().allowed(),
        })
    }

    /// Parse a delimited file and anonymize it.
    pub fn anonymize_file(
        &self,
        path: impl AsRef<Path>,
        definition: &DataDefinition,
    ) -> Result<(AnonymizationResult, SourceMetadata)> {
        let (table, source) = Parser::new().parse_file(path)?;
        let result = self.anonymize(&table, definition)?;
        Ok((result, source))
    }

    /// Find the minimum-loss transformation satisfying every criterion and
    /// apply it.
    pub fn anonymize(
        &self,
        table: &DataTable,
        definition: &DataDefinition,
    ) -> Result<AnonymizationResult> {
        let prepared = self.prepare(table, definition)?;
        let Prepared {
            view,
            lattice,
            criteria,
            model,
        } = &prepared;

        info!(
            records = view.row_count(),
            quasi_identifiers = view.quasi_identifiers().len(),
            nodes = lattice.size(),
            criteria = self.config.criteria.len(),
            metric = %self.config.metric,
            "Starting anonymization"
        );

        let outcome = SearchEngine::new(view, lattice, criteria, model, &self.config.search).run();
        let quasi_identifiers = view
            .quasi_identifiers()
            .iter()
            .map(|qi| qi.name().to_string())
            .collect();

        let Some(best) = outcome.best else {
            return Ok(AnonymizationResult {
                quasi_identifiers,
                transformation: None,
                loss: None,
                metric: self.config.metric,
                optimal: false,
                suppressed_records: 0,
                output: None,
                summary: None,
                fingerprint: None,
                statistics: outcome.statistics,
            });
        };

        let applier =
            TransformationApplier::new(view, lattice, criteria, &self.config.suppression_marker);
        let (output, summary) = applier.apply(table, best.node)?;
        let fingerprint = output.fingerprint();
        debug!(fingerprint = %fingerprint, "Released table");

        Ok(AnonymizationResult {
            quasi_identifiers,
            transformation: Some(best.transformation),
            loss: Some(best.loss),
            metric: self.config.metric,
            optimal: outcome.optimal,
            suppressed_records: summary.suppressed_count(),
            output: Some(output),
            summary: Some(summary),
            fingerprint: Some(fingerprint),
            statistics: outcome.statistics,
        })
    }

    /// Run every pre-search check and build the search inputs.
    fn prepare(&self, table: &DataTable, definition: &DataDefinition) -> Result<Prepared> {
        self.config.validate()?;
        if table.row_count() == 0 {
            return Err(ShroudError::EmptyData("No records to anonymize".to_string()));
        }
        definition.check_columns(&table.headers)?;

        let roles = definition.roles_for(&table.headers);
        if !roles.contains(&AttributeType::QuasiIdentifying) {
            let message = if roles.iter().all(|r| *r == AttributeType::Identifying) {
                "every attribute is identifying; nothing would be released"
            } else {
                "at least one quasi-identifying attribute is required"
            };
            return Err(ShroudError::config("attributes", message));
        }

        let sensitive = definition.columns_of(&table.headers, AttributeType::Sensitive);
        if sensitive.len() > 1 && self.config.requires_sensitive() {
            return Err(ShroudError::config(
                sensitive.join(", "),
                format!(
                    "{} sensitive attributes defined; the configured criteria support exactly one",
                    sensitive.len()
                ),
            ));
        }

        let view = DatasetView::new(table, definition)?;
        let lattice = Lattice::new(&view.heights())?;
        let budget =
            SuppressionBudget::from_fraction(self.config.allowed_outlier_fraction, view.row_count());
        let criteria = CriterionSet::prepare(&self.config.criteria, &view, budget)?;
        let model = LossModel::new(self.config.metric, &lattice, view.row_count())?;

        Ok(Prepared {
            view,
            lattice,
            criteria,
            model,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::PrivacyCriterion;
    use crate::hierarchy::Hierarchy;
    use crate::search::SearchStrategy;

    fn table() -> DataTable {
        DataTable::from_records(
            ["name", "age", "disease"],
            vec![
                vec!["Ann", "34", "flu"],
                vec!["Bob", "38", "cold"],
                vec!["Cid", "45", "flu"],
                vec!["Dee", "47", "cough"],
            ],
        )
        .unwrap()
    }

    fn age() -> Hierarchy {
        Hierarchy::builder()
            .add(["34", "30-39", "*"])
            .add(["38", "30-39", "*"])
            .add(["45", "40-49", "*"])
            .add(["47", "40-49", "*"])
            .build()
            .unwrap()
    }

    fn k(k: usize) -> Anonymizer {
        Anonymizer::with_config(
            AnonymizationConfig::new().with_criterion(PrivacyCriterion::k_anonymity(k)),
        )
    }

    #[test]
    fn test_plan_describes_search_space() {
        let definition = DataDefinition::new()
            .with_attribute("name", AttributeType::Identifying)
            .with_hierarchy("age", age())
            .with_attribute("disease", AttributeType::Sensitive);
        let plan = k(2).plan(&table(), &definition).unwrap();

        assert_eq!(plan.records, 4);
        assert_eq!(plan.lattice_size, 3);
        assert_eq!(plan.outlier_budget, 0);
        assert_eq!(plan.attributes[0].role, AttributeType::Identifying);
        assert_eq!(plan.attributes[1].height, Some(3));
        assert_eq!(plan.attributes[2].height, None);
    }

    #[test]
    fn test_anonymize_masks_identifiers() {
        let definition = DataDefinition::new()
            .with_attribute("name", AttributeType::Identifying)
            .with_hierarchy("age", age())
            .with_attribute("disease", AttributeType::Sensitive);
        let result = k(2).anonymize(&table(), &definition).unwrap();

        assert!(result.is_result_available());
        assert!(result.optimal);
        assert_eq!(result.quasi_identifiers, vec!["age"]);
        let output = result.output.unwrap();
        assert_eq!(output.rows[3], vec!["*", "40-49", "cough"]);
        assert!(result.fingerprint.unwrap().starts_with("sha256:"));
    }

    #[test]
    fn test_no_solution_is_not_an_error() {
        let definition = DataDefinition::new().with_hierarchy("age", age());
        let result = k(5).anonymize(&table(), &definition).unwrap();
        assert!(!result.is_result_available());
        assert!(result.is_proven_unsatisfiable());
        assert!(result.transformation.is_none());
        assert!(result.summary.is_none());
    }

    #[test]
    fn test_truncated_search_proves_nothing() {
        let definition = DataDefinition::new().with_hierarchy("age", age());
        let config = AnonymizationConfig::new()
            .with_criterion(PrivacyCriterion::k_anonymity(2))
            .with_strategy(SearchStrategy::Exhaustive)
            .with_max_evaluations(1);
        let result = Anonymizer::with_config(config)
            .anonymize(&table(), &definition)
            .unwrap();

        // only the untransformed node was evaluated, and every age is unique there
        assert_eq!(result.statistics.evaluated, 1);
        assert!(!result.statistics.complete);
        assert!(!result.is_result_available());
        assert!(!result.is_proven_unsatisfiable());
        assert!(!result.optimal);
    }

    #[test]
    fn test_precondition_errors() {
        let only_identifying = DataDefinition::new()
            .with_attribute("name", AttributeType::Identifying)
            .with_attribute("age", AttributeType::Identifying)
            .with_attribute("disease", AttributeType::Identifying);
        let error = k(2).anonymize(&table(), &only_identifying).unwrap_err();
        assert!(error.to_string().contains("every attribute is identifying"));

        let no_hierarchy = DataDefinition::new()
            .with_attribute("age", AttributeType::QuasiIdentifying);
        assert!(k(2).anonymize(&table(), &no_hierarchy).unwrap_err().is_configuration());

        let empty = DataTable::from_records(["age"], Vec::<Vec<&str>>::new()).unwrap();
        let definition = DataDefinition::new().with_hierarchy("age", age());
        assert!(matches!(
            k(2).anonymize(&empty, &definition),
            Err(ShroudError::EmptyData(_))
        ));
    }

    #[test]
    fn test_two_sensitive_attributes_allowed_without_sensitive_criteria() {
        let definition = DataDefinition::new()
            .with_attribute("name", AttributeType::Sensitive)
            .with_hierarchy("age", age())
            .with_attribute("disease", AttributeType::Sensitive);
        assert!(k(2).anonymize(&table(), &definition).is_ok());

        let diverse = Anonymizer::with_config(
            AnonymizationConfig::new()
                .with_criterion(PrivacyCriterion::distinct_l_diversity(2)),
        );
        let error = diverse.anonymize(&table(), &definition).unwrap_err();
        assert!(error.is_configuration());
    }
}
