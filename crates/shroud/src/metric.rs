//! Information-loss metrics used to rank anonymous transformations.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classes::EquivalenceClasses;
use crate::criteria::Assessment;
use crate::error::{Result, ShroudError};
use crate::lattice::{Lattice, NodeId};

/// How the loss of a transformation is measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfoLossMetric {
    /// Sum of generalization levels.
    #[default]
    Height,
    /// Mean of `level / (height - 1)` over quasi-identifiers.
    Precision,
    /// Sum of squared class sizes; suppressed records cost the dataset size.
    Discernibility,
}

impl InfoLossMetric {
    /// Returns true if the loss depends on the level vector only.
    ///
    /// Such losses grow with every generalization step, so the loss of a node
    /// bounds the loss of all nodes above it.
    pub fn is_level_based(&self) -> bool {
        !matches!(self, InfoLossMetric::Discernibility)
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            InfoLossMetric::Height => "height",
            InfoLossMetric::Precision => "precision",
            InfoLossMetric::Discernibility => "discernibility",
        }
    }
}

impl fmt::Display for InfoLossMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An exact loss value `numerator / denominator`.
///
/// All losses of one run share a denominator, so comparisons are exact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InformationLoss {
    numerator: u64,
    denominator: u64,
}

impl InformationLoss {
    fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Loss as a floating-point number.
    pub fn value(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Numerator of the exact fraction.
    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    /// Denominator of the exact fraction.
    pub fn denominator(&self) -> u64 {
        self.denominator
    }
}

impl PartialEq for InformationLoss {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for InformationLoss {}

impl PartialOrd for InformationLoss {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InformationLoss {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.denominator == other.denominator {
            return self.numerator.cmp(&other.numerator);
        }
        let left = u128::from(self.numerator) * u128::from(other.denominator);
        let right = u128::from(other.numerator) * u128::from(self.denominator);
        left.cmp(&right)
    }
}

impl fmt::Display for InformationLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}", self.numerator)
        } else {
            write!(f, "{:.4}", self.value())
        }
    }
}

/// A metric bound to one lattice and dataset size.
#[derive(Debug, Clone)]
pub struct LossModel {
    metric: InfoLossMetric,
    /// Per-dimension weight of one level, over `denominator`.
    weights: Vec<u64>,
    denominator: u64,
    row_count: u64,
}

impl LossModel {
    /// Prepare `metric` for `lattice` over `row_count` records.
    pub fn new(metric: InfoLossMetric, lattice: &Lattice, row_count: usize) -> Result<Self> {
        let overflow = || {
            ShroudError::config(
                metric.label(),
                "hierarchy heights are too diverse for exact loss computation",
            )
        };
        let (weights, denominator) = match metric {
            InfoLossMetric::Height | InfoLossMetric::Discernibility => {
                (vec![1; lattice.dimensions()], 1)
            }
            InfoLossMetric::Precision => {
                let mut common: u64 = 1;
                for &height in lattice.heights() {
                    if height > 1 {
                        common = lcm(common, height as u64 - 1).ok_or_else(overflow)?;
                    }
                }
                let weights = lattice
                    .heights()
                    .iter()
                    .map(|&h| if h > 1 { common / (h as u64 - 1) } else { 0 })
                    .collect();
                let denominator = common
                    .checked_mul(lattice.dimensions() as u64)
                    .ok_or_else(overflow)?;
                (weights, denominator)
            }
        };
        Ok(Self {
            metric,
            weights,
            denominator,
            row_count: row_count as u64,
        })
    }

    /// The metric being computed.
    pub fn metric(&self) -> InfoLossMetric {
        self.metric
    }

    /// Loss of `node` given its classes and their assessment.
    pub fn loss(
        &self,
        lattice: &Lattice,
        node: NodeId,
        classes: &EquivalenceClasses,
        assessment: &Assessment,
    ) -> InformationLoss {
        match self.metric {
            InfoLossMetric::Height | InfoLossMetric::Precision => self.level_loss(lattice, node),
            InfoLossMetric::Discernibility => {
                let retained: u64 = classes
                    .iter()
                    .filter(|class| !assessment.outlier_classes[class.id()])
                    .map(|class| {
                        let size = class.size() as u64;
                        size * size
                    })
                    .sum();
                let suppressed = assessment.outlier_records as u64 * self.row_count;
                InformationLoss::new(retained + suppressed, 1)
            }
        }
    }

    /// A loss no node generalizing `node` can undercut, if one is known
    /// without building classes.
    pub fn lower_bound(&self, lattice: &Lattice, node: NodeId) -> Option<InformationLoss> {
        self.metric
            .is_level_based()
            .then(|| self.level_loss(lattice, node))
    }

    fn level_loss(&self, lattice: &Lattice, node: NodeId) -> InformationLoss {
        let numerator = self
            .weights
            .iter()
            .enumerate()
            .map(|(dim, weight)| lattice.level(node, dim) as u64 * weight)
            .sum();
        InformationLoss::new(numerator, self.denominator)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}
