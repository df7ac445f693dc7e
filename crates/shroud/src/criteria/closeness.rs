//! Distances between a class's sensitive distribution and the dataset's.

use std::collections::HashMap;

use crate::classes::FrequencyTable;
use crate::dataset::SensitiveAttribute;
use crate::error::{Result, ShroudError};
use crate::hierarchy::{Hierarchy, HierarchyError};

/// Variational distance `½·Σ|p_v − q_v|` over the whole sensitive domain.
///
/// `global` is indexed by value code; codes missing from `class` have `p_v = 0`.
pub fn equal_distance(class: &FrequencyTable, global: &[f64]) -> f64 {
    if class.total() == 0 {
        return 0.0;
    }
    let size = class.total() as f64;
    let mut entries = class.entries().iter().peekable();
    let mut sum = 0.0;
    for (code, &q) in global.iter().enumerate() {
        let p = match entries.peek() {
            Some(&&(c, count)) if c as usize == code => {
                entries.next();
                count as f64 / size
            }
            _ => 0.0,
        };
        sum += (p - q).abs();
    }
    sum / 2.0
}

/// Sensitive-value hierarchy resolved to dense node indices per level.
#[derive(Debug, Clone)]
pub struct SensitiveTree {
    /// `leaf_parent[code]`: level-1 node of each sensitive value code.
    leaf_parent: Vec<usize>,
    /// `parents[j]`: for every node at level `j + 1`, its node at level `j + 2`.
    parents: Vec<Vec<usize>>,
    /// Number of nodes per level, starting at level 1.
    widths: Vec<usize>,
}

impl SensitiveTree {
    /// Resolve `hierarchy` against the sensitive attribute's dictionary.
    ///
    /// The hierarchy must cover every sensitive value, have a single root and
    /// at least one generalization level.
    pub fn build(hierarchy: &Hierarchy, sensitive: &SensitiveAttribute) -> Result<Self> {
        let attribute = sensitive.name();
        let height = hierarchy.height();
        if height < 2 {
            return Err(ShroudError::hierarchy(
                attribute,
                HierarchyError::NoGeneralization { height },
            ));
        }
        let roots = hierarchy.distinct_at(height - 1);
        if roots != 1 {
            return Err(ShroudError::hierarchy(
                attribute,
                HierarchyError::MultipleRoots { count: roots },
            ));
        }

        // node index at each level >= 1 for every sensitive code
        let mut ids: Vec<HashMap<&str, usize>> = vec![HashMap::new(); height - 1];
        let mut paths: Vec<Vec<usize>> = Vec::with_capacity(sensitive.dictionary().len());
        for value in sensitive.dictionary().iter() {
            let row = hierarchy.row(value).ok_or_else(|| {
                ShroudError::hierarchy(
                    attribute,
                    HierarchyError::MissingValue {
                        value: value.to_string(),
                    },
                )
            })?;
            let path = row[1..]
                .iter()
                .zip(ids.iter_mut())
                .map(|(label, level)| {
                    let next = level.len();
                    *level.entry(label.as_str()).or_insert(next)
                })
                .collect();
            paths.push(path);
        }

        let widths: Vec<usize> = ids.iter().map(HashMap::len).collect();
        let leaf_parent = paths.iter().map(|path| path[0]).collect();
        let mut parents: Vec<Vec<usize>> = widths[..widths.len() - 1]
            .iter()
            .map(|&width| vec![0; width])
            .collect();
        for path in &paths {
            for (level, pair) in path.windows(2).enumerate() {
                parents[level][pair[0]] = pair[1];
            }
        }

        Ok(Self {
            leaf_parent,
            parents,
            widths,
        })
    }

    /// Tree height `H'`: the number of levels above the leaves.
    pub fn height(&self) -> usize {
        self.widths.len()
    }

    /// Hierarchical earth mover's distance between a class and `global`.
    ///
    /// Moving mass between two values costs the level of their lowest common
    /// ancestor divided by the tree height. The cost at each inner node is
    /// computed from the surplus and deficit its children pass up.
    pub fn distance(&self, class: &FrequencyTable, global: &[f64]) -> f64 {
        if class.total() == 0 {
            return 0.0;
        }
        let size = class.total() as f64;
        let height = self.height() as f64;

        let mut extra: Vec<f64> = global.iter().map(|q| -q).collect();
        for &(code, count) in class.entries() {
            extra[code as usize] += count as f64 / size;
        }

        let mut cost = 0.0;
        let mut below = extra;
        let mut parent_of: &[usize] = &self.leaf_parent;
        for level in 0..self.height() {
            let width = self.widths[level];
            let mut positive = vec![0.0; width];
            let mut negative = vec![0.0; width];
            for (child, &value) in below.iter().enumerate() {
                let parent = parent_of[child];
                if value > 0.0 {
                    positive[parent] += value;
                } else {
                    negative[parent] -= value;
                }
            }
            let weight = (level + 1) as f64 / height;
            below = positive
                .iter()
                .zip(&negative)
                .map(|(&pos, &neg)| {
                    cost += weight * pos.min(neg);
                    pos - neg
                })
                .collect();
            if let Some(next) = self.parents.get(level) {
                parent_of = next;
            }
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DatasetView;
    use crate::input::DataTable;
    use crate::schema::{AttributeType, DataDefinition};

    fn sensitive(values: &[&str]) -> DatasetView {
        let rows = values.iter().map(|v| vec![*v, "x"]).collect();
        let table = DataTable::from_records(["disease", "qi"], rows).unwrap();
        let definition = DataDefinition::new()
            .with_attribute("disease", AttributeType::Sensitive)
            .with_hierarchy("qi", Hierarchy::builder().add(["x", "*"]).build().unwrap());
        DatasetView::new(&table, &definition).unwrap()
    }

    fn diseases() -> Hierarchy {
        Hierarchy::builder()
            .add(["gastric ulcer", "stomach disease", "digestive disease", "*"])
            .add(["gastritis", "stomach disease", "digestive disease", "*"])
            .add(["stomach cancer", "stomach disease", "digestive disease", "*"])
            .add(["colitis", "colon disease", "digestive disease", "*"])
            .add(["colon cancer", "colon disease", "digestive disease", "*"])
            .add(["flu", "respiratory infection", "vascular lung disease", "*"])
            .add(["pneumonia", "respiratory infection", "vascular lung disease", "*"])
            .add(["bronchitis", "respiratory infection", "vascular lung disease", "*"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_equal_distance() {
        let global = [0.5, 0.25, 0.25];
        assert_eq!(equal_distance(&FrequencyTable::from_codes([0, 1, 2, 0]), &global), 0.0);
        let skewed = FrequencyTable::from_codes([1, 1]);
        assert!((equal_distance(&skewed, &global) - 0.75).abs() < 1e-12);
        assert_eq!(equal_distance(&FrequencyTable::from_codes([]), &global), 0.0);
    }

    #[test]
    fn test_hierarchical_distance_for_sibling_shift() {
        let view = sensitive(&["gastric ulcer", "gastritis"]);
        let sensitive = view.sensitive().unwrap();
        let tree = SensitiveTree::build(&diseases(), sensitive).unwrap();
        assert_eq!(tree.height(), 3);

        // all mass on one sibling: move 0.5 at cost 1/3
        let class = FrequencyTable::from_codes([0, 0]);
        let distance = tree.distance(&class, &sensitive.distribution());
        assert!((distance - 0.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_hierarchical_distance_across_root() {
        let view = sensitive(&["gastric ulcer", "flu"]);
        let sensitive = view.sensitive().unwrap();
        let tree = SensitiveTree::build(&diseases(), sensitive).unwrap();

        let class = FrequencyTable::from_codes([1]);
        let distance = tree.distance(&class, &sensitive.distribution());
        assert!((distance - 0.5).abs() < 1e-12);

        let balanced = FrequencyTable::from_codes([0, 1]);
        assert!(tree.distance(&balanced, &sensitive.distribution()).abs() < 1e-12);
    }

    #[test]
    fn test_tree_requirements() {
        let view = sensitive(&["flu", "cold"]);
        let sensitive = view.sensitive().unwrap();

        let flat = Hierarchy::builder().add(["flu"]).add(["cold"]).build().unwrap();
        assert!(matches!(
            SensitiveTree::build(&flat, sensitive),
            Err(ShroudError::InvalidHierarchy {
                source: HierarchyError::NoGeneralization { height: 1 },
                ..
            })
        ));

        let forest = Hierarchy::builder()
            .add(["flu", "a"])
            .add(["cold", "b"])
            .build()
            .unwrap();
        assert!(matches!(
            SensitiveTree::build(&forest, sensitive),
            Err(ShroudError::InvalidHierarchy {
                source: HierarchyError::MultipleRoots { count: 2 },
                ..
            })
        ));

        let partial = Hierarchy::builder().add(["flu", "*"]).build().unwrap();
        assert!(matches!(
            SensitiveTree::build(&partial, sensitive),
            Err(ShroudError::InvalidHierarchy {
                source: HierarchyError::MissingValue { .. },
                ..
            })
        ));
    }
}
