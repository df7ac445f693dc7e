//! Anonymization options and their JSON persistence.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::criteria::PrivacyCriterion;
use crate::error::{Result, ShroudError};
use crate::metric::InfoLossMetric;
use crate::search::{SearchConfig, SearchStrategy};

/// Everything that parameterizes one anonymization run.
///
/// The configuration is passed explicitly to every run; nothing is global.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnonymizationConfig {
    /// Value written into suppressed and masked cells.
    pub suppression_marker: String,
    /// Fraction of records that may be suppressed as outliers, in `[0, 1]`.
    pub allowed_outlier_fraction: f64,
    /// Criteria that must all hold.
    pub criteria: Vec<PrivacyCriterion>,
    /// Loss metric used to rank anonymous transformations.
    pub metric: InfoLossMetric,
    /// Search options.
    pub search: SearchConfig,
}

impl Default for AnonymizationConfig {
    fn default() -> Self {
        Self {
            suppression_marker: "*".to_string(),
            allowed_outlier_fraction: 0.0,
            criteria: Vec::new(),
            metric: InfoLossMetric::default(),
            search: SearchConfig::default(),
        }
    }
}

impl AnonymizationConfig {
    /// Default options with no criteria.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a privacy criterion.
    pub fn with_criterion(mut self, criterion: PrivacyCriterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    /// Set the allowed outlier fraction.
    pub fn with_outlier_fraction(mut self, fraction: f64) -> Self {
        self.allowed_outlier_fraction = fraction;
        self
    }

    /// Set the suppression marker.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.suppression_marker = marker.into();
        self
    }

    /// Set the loss metric.
    pub fn with_metric(mut self, metric: InfoLossMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the search strategy.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.search.strategy = strategy;
        self
    }

    /// Set the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.search.workers = Some(workers);
        self
    }

    /// Stop the search after `evaluations` node evaluations.
    pub fn with_max_evaluations(mut self, evaluations: usize) -> Self {
        self.search.max_evaluations = Some(evaluations);
        self
    }

    /// Stop the search after `ms` milliseconds.
    pub fn with_time_limit_ms(mut self, ms: u64) -> Self {
        self.search.time_limit_ms = Some(ms);
        self
    }

    /// Returns true if any criterion inspects the sensitive attribute.
    pub fn requires_sensitive(&self) -> bool {
        self.criteria.iter().any(PrivacyCriterion::requires_sensitive)
    }

    /// Check every option that does not depend on the data.
    pub fn validate(&self) -> Result<()> {
        let fraction = self.allowed_outlier_fraction;
        if !(fraction.is_finite() && (0.0..=1.0).contains(&fraction)) {
            return Err(ShroudError::config(
                "allowed_outlier_fraction",
                format!("must lie within [0, 1], got {}", fraction),
            ));
        }
        if self.criteria.is_empty() {
            return Err(ShroudError::config(
                "criteria",
                "at least one privacy criterion is required",
            ));
        }
        for criterion in &self.criteria {
            criterion.validate()?;
        }
        self.search.validate()
    }

    /// Save the configuration to a JSON file.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use shroud::{AnonymizationConfig, PrivacyCriterion};
    /// # fn example() -> shroud::Result<()> {
    /// AnonymizationConfig::new()
    ///     .with_criterion(PrivacyCriterion::k_anonymity(5))
    ///     .save("release.config.json")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| ShroudError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = File::create(path).map_err(|source| ShroudError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ShroudError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }
}
