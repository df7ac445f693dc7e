//! Optimal-node search over the transformation lattice.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classes::ClassAnalyzer;
use crate::criteria::CriterionSet;
use crate::dataset::DatasetView;
use crate::error::{Result, ShroudError};
use crate::lattice::{Lattice, NodeId, Transformation};
use crate::metric::{InformationLoss, LossModel};

use super::tags::{Tag, TagStore};

/// Traversal strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Bottom-up traversal that infers tags and skips nodes by loss bound.
    #[default]
    Pruned,
    /// Evaluates every node.
    Exhaustive,
}

/// Search options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Traversal strategy.
    pub strategy: SearchStrategy,
    /// Worker threads (None = available parallelism).
    pub workers: Option<usize>,
    /// Stop after this many node evaluations.
    pub max_evaluations: Option<usize>,
    /// Stop after this many milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl SearchConfig {
    /// Check option ranges.
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(ShroudError::config("search.workers", "must be at least 1"));
        }
        if self.max_evaluations == Some(0) {
            return Err(ShroudError::config(
                "search.max_evaluations",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Counters describing one search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// Nodes in the lattice.
    pub nodes: usize,
    /// Nodes whose classes were built and checked.
    pub evaluated: usize,
    /// Nodes tagged anonymous without evaluation.
    pub inferred_anonymous: usize,
    /// Nodes tagged not anonymous without evaluation.
    pub inferred_not_anonymous: usize,
    /// Nodes skipped because their loss bound exceeds the best node.
    pub skipped_by_bound: usize,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
    /// False if an evaluation or time limit cut the search short.
    pub complete: bool,
}

/// An anonymous node and its loss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub node: NodeId,
    pub transformation: Transformation,
    pub loss: InformationLoss,
    pub outlier_records: usize,
}

impl Candidate {
    /// Lower loss first, then the lexicographically smaller level vector.
    fn beats(&self, other: &Candidate) -> bool {
        (self.loss, self.node) < (other.loss, other.node)
    }
}

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best anonymous node found, if any.
    pub best: Option<Candidate>,
    /// True if `best` is proven optimal.
    pub optimal: bool,
    pub statistics: SearchStatistics,
}

#[derive(Debug)]
struct Evaluation {
    node: NodeId,
    anonymous: bool,
    outlier_records: usize,
    loss: Option<InformationLoss>,
    inferred: usize,
}

/// Finds the anonymous node of minimum information loss.
#[derive(Debug)]
pub struct SearchEngine<'a> {
    view: &'a DatasetView,
    lattice: &'a Lattice,
    criteria: &'a CriterionSet,
    model: &'a LossModel,
    config: &'a SearchConfig,
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        view: &'a DatasetView,
        lattice: &'a Lattice,
        criteria: &'a CriterionSet,
        model: &'a LossModel,
        config: &'a SearchConfig,
    ) -> Self {
        Self {
            view,
            lattice,
            criteria,
            model,
            config,
        }
    }

    /// Run the configured strategy.
    pub fn run(&self) -> SearchOutcome {
        let started = Instant::now();
        let deadline = self
            .config
            .time_limit_ms
            .map(|ms| started + Duration::from_millis(ms));
        let propagate = self.config.strategy == SearchStrategy::Pruned;
        let tags = TagStore::new(self.lattice.size());

        let mut statistics = SearchStatistics {
            nodes: self.lattice.size(),
            complete: true,
            ..SearchStatistics::default()
        };
        let mut best: Option<Candidate> = None;

        let mut top_evaluated = false;
        if propagate {
            let top = self.evaluate(self.lattice.top(), &tags, true);
            statistics.evaluated += 1;
            top_evaluated = true;
            if !top.anonymous {
                statistics.inferred_not_anonymous += top.inferred;
                statistics.elapsed_ms = started.elapsed().as_millis() as u64;
                info!(
                    nodes = statistics.nodes,
                    "No transformation satisfies the criteria: the top node is not anonymous"
                );
                return SearchOutcome {
                    best: None,
                    optimal: false,
                    statistics,
                };
            }
            self.consider(&top, &mut best);
        }

        for height in 0..=self.lattice.max_height() {
            if expired(deadline) {
                statistics.complete = false;
                break;
            }

            let mut frontier = Vec::new();
            for node in self.lattice.nodes_at_height(height) {
                if !propagate {
                    frontier.push(node);
                    continue;
                }
                match tags.get(node) {
                    Tag::NotAnonymous => {}
                    Tag::Anonymous => {
                        // inferred nodes only matter when the loss depends on classes
                        let evaluated = top_evaluated && node == self.lattice.top();
                        if !evaluated && !self.model.metric().is_level_based() {
                            frontier.push(node);
                        }
                    }
                    Tag::Unknown => {
                        if self.bounded_out(node, best.as_ref()) {
                            statistics.skipped_by_bound += 1;
                        } else {
                            frontier.push(node);
                        }
                    }
                }
            }

            if let Some(limit) = self.config.max_evaluations {
                let remaining = limit.saturating_sub(statistics.evaluated);
                if frontier.len() > remaining {
                    frontier.truncate(remaining);
                    statistics.complete = false;
                }
            }
            if frontier.is_empty() {
                if statistics.complete {
                    continue;
                }
                break;
            }

            debug!(height, frontier = frontier.len(), "Evaluating lattice height");
            let scheduled = frontier.len();
            let results = self.evaluate_frontier(&frontier, &tags, propagate, deadline);
            if results.len() < scheduled {
                statistics.complete = false;
            }

            for evaluation in &results {
                statistics.evaluated += 1;
                if evaluation.anonymous {
                    statistics.inferred_anonymous += evaluation.inferred;
                } else {
                    statistics.inferred_not_anonymous += evaluation.inferred;
                }
                self.consider(evaluation, &mut best);
            }

            if !statistics.complete {
                break;
            }
        }

        statistics.elapsed_ms = started.elapsed().as_millis() as u64;
        if !statistics.complete {
            warn!(
                evaluated = statistics.evaluated,
                "Search stopped at its limit; the result may not be optimal"
            );
        }
        match &best {
            Some(candidate) => info!(
                transformation = %candidate.transformation,
                loss = %candidate.loss,
                evaluated = statistics.evaluated,
                inferred = statistics.inferred_anonymous + statistics.inferred_not_anonymous,
                elapsed_ms = statistics.elapsed_ms,
                "Search finished"
            ),
            None => info!(
                evaluated = statistics.evaluated,
                "No transformation satisfies the criteria"
            ),
        }

        SearchOutcome {
            optimal: statistics.complete && best.is_some(),
            best,
            statistics,
        }
    }

    /// Build classes at `node`, assess them and record the verdict.
    fn evaluate(&self, node: NodeId, tags: &TagStore, propagate: bool) -> Evaluation {
        let classes = ClassAnalyzer::new(self.view, self.lattice)
            .analyze(node, self.criteria.requirements());
        let assessment = self.criteria.assess(&classes);
        let loss = assessment
            .anonymous
            .then(|| self.model.loss(self.lattice, node, &classes, &assessment));
        let inferred = if propagate {
            tags.record(self.lattice, node, assessment.anonymous)
        } else {
            tags.mark(node, assessment.anonymous);
            0
        };
        Evaluation {
            node,
            anonymous: assessment.anonymous,
            outlier_records: assessment.outlier_records,
            loss,
            inferred,
        }
    }

    /// Evaluate one frontier on the worker pool; results come back in node order.
    fn evaluate_frontier(
        &self,
        frontier: &[NodeId],
        tags: &TagStore,
        propagate: bool,
        deadline: Option<Instant>,
    ) -> Vec<Evaluation> {
        let workers = self.config.worker_count().clamp(1, frontier.len().max(1));
        if workers == 1 {
            return frontier
                .iter()
                .map_while(|&node| (!expired(deadline)).then(|| self.evaluate(node, tags, propagate)))
                .collect();
        }

        let cursor = AtomicUsize::new(0);
        let cursor = &cursor;
        let mut results: Vec<Evaluation> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        let mut local = Vec::new();
                        while !expired(deadline) {
                            let index = cursor.fetch_add(1, Ordering::Relaxed);
                            let Some(&node) = frontier.get(index) else {
                                break;
                            };
                            local.push(self.evaluate(node, tags, propagate));
                        }
                        local
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|handle| {
                    handle
                        .join()
                        .unwrap_or_else(|payload| std::panic::resume_unwind(payload))
                })
                .collect()
        });
        results.sort_by_key(|evaluation| evaluation.node);
        results
    }

    fn bounded_out(&self, node: NodeId, best: Option<&Candidate>) -> bool {
        let (Some(best), Some(bound)) = (best, self.model.lower_bound(self.lattice, node)) else {
            return false;
        };
        (bound, node) > (best.loss, best.node)
    }

    fn consider(&self, evaluation: &Evaluation, best: &mut Option<Candidate>) {
        let Some(loss) = evaluation.loss else {
            return;
        };
        let candidate = Candidate {
            node: evaluation.node,
            transformation: self.lattice.transformation(evaluation.node),
            loss,
            outlier_records: evaluation.outlier_records,
        };
        if best.as_ref().is_none_or(|current| candidate.beats(current)) {
            *best = Some(candidate);
        }
    }
}

fn expired(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|deadline| Instant::now() >= deadline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{PrivacyCriterion, SuppressionBudget};
    use crate::hierarchy::Hierarchy;
    use crate::input::DataTable;
    use crate::metric::InfoLossMetric;
    use crate::schema::DataDefinition;

    fn view() -> DatasetView {
        let table = DataTable::from_records(
            ["age", "zip"],
            vec![
                vec!["21", "10115"],
                vec!["23", "10117"],
                vec!["35", "10115"],
                vec!["38", "20095"],
                vec!["52", "20097"],
                vec!["57", "20095"],
            ],
        )
        .unwrap();
        let age = Hierarchy::builder()
            .add(["21", "20-29", "<40", "*"])
            .add(["23", "20-29", "<40", "*"])
            .add(["35", "30-39", "<40", "*"])
            .add(["38", "30-39", "<40", "*"])
            .add(["52", "50-59", ">=40", "*"])
            .add(["57", "50-59", ">=40", "*"])
            .build()
            .unwrap();
        let zip = Hierarchy::builder()
            .add(["10115", "1011*", "*"])
            .add(["10117", "1011*", "*"])
            .add(["20095", "2009*", "*"])
            .add(["20097", "2009*", "*"])
            .build()
            .unwrap();
        let definition = DataDefinition::new()
            .with_hierarchy("age", age)
            .with_hierarchy("zip", zip);
        DatasetView::new(&table, &definition).unwrap()
    }

    fn search(k: usize, metric: InfoLossMetric, config: SearchConfig) -> SearchOutcome {
        let view = view();
        let lattice = Lattice::new(&view.heights()).unwrap();
        let criteria = CriterionSet::prepare(
            &[PrivacyCriterion::k_anonymity(k)],
            &view,
            SuppressionBudget::records(0),
        )
        .unwrap();
        let model = LossModel::new(metric, &lattice, view.row_count()).unwrap();
        SearchEngine::new(&view, &lattice, &criteria, &model, &config).run()
    }

    #[test]
    fn test_pruned_search_finds_minimum() {
        let outcome = search(2, InfoLossMetric::Height, SearchConfig::default());
        let best = outcome.best.unwrap();
        // every node below height 3 leaves a singleton; (1, 2) pairs the decades
        assert_eq!(best.transformation.levels(), &[1, 2]);
        assert!(outcome.optimal);
        assert!(outcome.statistics.complete);
        assert!(outcome.statistics.evaluated < outcome.statistics.nodes);
    }

    #[test]
    fn test_pruned_matches_exhaustive() {
        for k in 1..=6 {
            for metric in [
                InfoLossMetric::Height,
                InfoLossMetric::Precision,
                InfoLossMetric::Discernibility,
            ] {
                let pruned = search(k, metric, SearchConfig::default());
                let exhaustive = search(
                    k,
                    metric,
                    SearchConfig {
                        strategy: SearchStrategy::Exhaustive,
                        ..SearchConfig::default()
                    },
                );
                assert_eq!(
                    pruned.best.map(|c| c.node),
                    exhaustive.best.map(|c| c.node),
                    "k={k} metric={metric}"
                );
                assert_eq!(exhaustive.statistics.evaluated, exhaustive.statistics.nodes);
            }
        }
    }

    #[test]
    fn test_worker_count_does_not_change_result() {
        let single = search(
            3,
            InfoLossMetric::Precision,
            SearchConfig {
                workers: Some(1),
                ..SearchConfig::default()
            },
        );
        let parallel = search(
            3,
            InfoLossMetric::Precision,
            SearchConfig {
                workers: Some(4),
                ..SearchConfig::default()
            },
        );
        assert_eq!(single.best, parallel.best);
        assert_eq!(single.statistics.evaluated, parallel.statistics.evaluated);
    }

    #[test]
    fn test_unsatisfiable_top_stops_immediately() {
        let outcome = search(7, InfoLossMetric::Height, SearchConfig::default());
        assert!(outcome.best.is_none());
        assert!(!outcome.optimal);
        assert_eq!(outcome.statistics.evaluated, 1);
        assert_eq!(outcome.statistics.inferred_not_anonymous, outcome.statistics.nodes - 1);
    }

    #[test]
    fn test_evaluation_limit_reports_best_so_far() {
        let outcome = search(
            2,
            InfoLossMetric::Height,
            SearchConfig {
                max_evaluations: Some(2),
                ..SearchConfig::default()
            },
        );
        assert!(!outcome.statistics.complete);
        assert!(!outcome.optimal);
        assert_eq!(outcome.statistics.evaluated, 2);
        // the top node is always anonymous here, so some candidate exists
        assert!(outcome.best.is_some());
    }

    #[test]
    fn test_config_validation() {
        assert!(SearchConfig::default().validate().is_ok());
        let zero_workers = SearchConfig {
            workers: Some(0),
            ..SearchConfig::default()
        };
        assert!(zero_workers.validate().is_err());
    }
}
