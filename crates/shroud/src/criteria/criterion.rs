//! Privacy criteria as configured by the user.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShroudError};
use crate::hierarchy::Hierarchy;

/// A monotone privacy requirement that every released equivalence class must
/// meet, unless the class is suppressed within the outlier budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrivacyCriterion {
    /// Every class holds at least `k` records.
    KAnonymity { k: usize },
    /// Every class holds at least `l` distinct sensitive values.
    DistinctLDiversity { l: usize },
    /// The sensitive-value entropy of every class is at least `ln(l)`.
    EntropyLDiversity { l: f64 },
    /// The most frequent sensitive value is at most `c` times as frequent as
    /// the `l - 1` least frequent ones combined, and at least `l` values occur.
    #[serde(rename = "recursive_cl_diversity", alias = "recursive_c_l_diversity")]
    RecursiveCLDiversity { c: f64, l: usize },
    /// Variational distance to the dataset distribution is at most `t`.
    EqualDistanceTCloseness { t: f64 },
    /// Hierarchical earth mover's distance to the dataset distribution is at
    /// most `t`.
    HierarchicalDistanceTCloseness { t: f64, hierarchy: Hierarchy },
}

impl PrivacyCriterion {
    /// k-anonymity.
    pub fn k_anonymity(k: usize) -> Self {
        PrivacyCriterion::KAnonymity { k }
    }

    /// Distinct l-diversity.
    pub fn distinct_l_diversity(l: usize) -> Self {
        PrivacyCriterion::DistinctLDiversity { l }
    }

    /// Entropy l-diversity.
    pub fn entropy_l_diversity(l: f64) -> Self {
        PrivacyCriterion::EntropyLDiversity { l }
    }

    /// Recursive (c, l)-diversity.
    pub fn recursive_cl_diversity(c: f64, l: usize) -> Self {
        PrivacyCriterion::RecursiveCLDiversity { c, l }
    }

    /// t-closeness with equal ground distance.
    pub fn equal_distance_t_closeness(t: f64) -> Self {
        PrivacyCriterion::EqualDistanceTCloseness { t }
    }

    /// t-closeness with a hierarchical ground distance.
    pub fn hierarchical_t_closeness(t: f64, hierarchy: Hierarchy) -> Self {
        PrivacyCriterion::HierarchicalDistanceTCloseness { t, hierarchy }
    }

    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            PrivacyCriterion::KAnonymity { .. } => "k-anonymity",
            PrivacyCriterion::DistinctLDiversity { .. } => "distinct-l-diversity",
            PrivacyCriterion::EntropyLDiversity { .. } => "entropy-l-diversity",
            PrivacyCriterion::RecursiveCLDiversity { .. } => "recursive-cl-diversity",
            PrivacyCriterion::EqualDistanceTCloseness { .. } => "equal-distance-t-closeness",
            PrivacyCriterion::HierarchicalDistanceTCloseness { .. } => {
                "hierarchical-distance-t-closeness"
            }
        }
    }

    /// Returns true if the criterion inspects the sensitive attribute.
    pub fn requires_sensitive(&self) -> bool {
        !matches!(self, PrivacyCriterion::KAnonymity { .. })
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let fail = |message: &str| Err(ShroudError::config(self.name(), message));
        match self {
            PrivacyCriterion::KAnonymity { k } if *k < 1 => fail("k must be at least 1"),
            PrivacyCriterion::DistinctLDiversity { l } if *l < 1 => {
                fail("l must be at least 1")
            }
            PrivacyCriterion::EntropyLDiversity { l } if !(l.is_finite() && *l >= 1.0) => {
                fail("l must be a finite number of at least 1")
            }
            PrivacyCriterion::RecursiveCLDiversity { c, l } => {
                if *l < 1 {
                    fail("l must be at least 1")
                } else if !(c.is_finite() && *c > 0.0) {
                    fail("c must be a finite positive number")
                } else {
                    Ok(())
                }
            }
            PrivacyCriterion::EqualDistanceTCloseness { t }
            | PrivacyCriterion::HierarchicalDistanceTCloseness { t, .. }
                if !(t.is_finite() && (0.0..=1.0).contains(t)) =>
            {
                fail("t must lie within [0, 1]")
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for PrivacyCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrivacyCriterion::KAnonymity { k } => write!(f, "{}-anonymity", k),
            PrivacyCriterion::DistinctLDiversity { l } => write!(f, "distinct-{}-diversity", l),
            PrivacyCriterion::EntropyLDiversity { l } => write!(f, "entropy-{}-diversity", l),
            PrivacyCriterion::RecursiveCLDiversity { c, l } => {
                write!(f, "recursive-({}, {})-diversity", c, l)
            }
            PrivacyCriterion::EqualDistanceTCloseness { t } => {
                write!(f, "{}-closeness (equal distance)", t)
            }
            PrivacyCriterion::HierarchicalDistanceTCloseness { t, .. } => {
                write!(f, "{}-closeness (hierarchical distance)", t)
            }
        }
    }
}
