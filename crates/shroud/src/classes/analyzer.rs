//! Grouping of records into equivalence classes at a lattice node.

use std::collections::HashMap;

use crate::dataset::DatasetView;
use crate::lattice::{Lattice, NodeId};

use super::frequency::FrequencyTable;

/// Which per-class statistics to compute besides the class size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassRequirements {
    /// Sensitive-value frequency table per class.
    pub sensitive_frequencies: bool,
    /// Class of every row, for rewriting the output.
    pub row_assignment: bool,
}

/// Records sharing one generalized quasi-identifier tuple.
#[derive(Debug, Clone)]
pub struct EquivalenceClass {
    id: usize,
    key: Box<[u32]>,
    size: usize,
    sensitive: Option<FrequencyTable>,
}

impl EquivalenceClass {
    /// Identifier: the order in which the class first occurs in the input.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Generalized quasi-identifier codes, one per dimension.
    pub fn key(&self) -> &[u32] {
        &self.key
    }

    /// Number of records.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sensitive-value frequencies, when requested.
    pub fn sensitive(&self) -> Option<&FrequencyTable> {
        self.sensitive.as_ref()
    }
}

/// All equivalence classes of one node.
#[derive(Debug, Clone)]
pub struct EquivalenceClasses {
    node: NodeId,
    classes: Vec<EquivalenceClass>,
    row_classes: Option<Vec<u32>>,
    row_count: usize,
}

impl EquivalenceClasses {
    /// Node the classes were built for.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true for an empty dataset.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &EquivalenceClass> {
        self.classes.iter()
    }

    /// Class by identifier.
    pub fn get(&self, id: usize) -> Option<&EquivalenceClass> {
        self.classes.get(id)
    }

    /// Class identifier of a row, when row assignment was requested.
    pub fn class_of(&self, row: usize) -> Option<usize> {
        self.row_classes
            .as_ref()
            .and_then(|rows| rows.get(row))
            .map(|&c| c as usize)
    }

    /// Total number of records.
    pub fn row_count(&self) -> usize {
        self.row_count
    }
}

/// Materializes equivalence classes for lattice nodes.
///
/// Classes are rebuilt for every call; grouping compares interned codes only.
#[derive(Debug, Clone, Copy)]
pub struct ClassAnalyzer<'a> {
    view: &'a DatasetView,
    lattice: &'a Lattice,
}

impl<'a> ClassAnalyzer<'a> {
    /// Create an analyzer over a view and its lattice.
    pub fn new(view: &'a DatasetView, lattice: &'a Lattice) -> Self {
        Self { view, lattice }
    }

    /// Group all records at `node`.
    pub fn analyze(&self, node: NodeId, requirements: ClassRequirements) -> EquivalenceClasses {
        let quasi_identifiers = self.view.quasi_identifiers();
        let row_count = self.view.row_count();

        let tables: Vec<&[u32]> = quasi_identifiers
            .iter()
            .enumerate()
            .map(|(dim, qi)| qi.level_table(self.lattice.level(node, dim)))
            .collect();
        let raw: Vec<&[u32]> = quasi_identifiers.iter().map(|qi| qi.raw_codes()).collect();

        let mut index: HashMap<Box<[u32]>, u32> = HashMap::new();
        let mut sizes: Vec<usize> = Vec::new();
        let mut row_classes: Vec<u32> = Vec::with_capacity(row_count);
        let mut key = vec![0u32; quasi_identifiers.len()];

        for row in 0..row_count {
            for (dim, slot) in key.iter_mut().enumerate() {
                *slot = tables[dim][raw[dim][row] as usize];
            }
            let class = match index.get(key.as_slice()) {
                Some(&class) => class,
                None => {
                    let class = sizes.len() as u32;
                    index.insert(key.clone().into_boxed_slice(), class);
                    sizes.push(0);
                    class
                }
            };
            sizes[class as usize] += 1;
            row_classes.push(class);
        }

        let mut keys: Vec<Box<[u32]>> = vec![Box::default(); sizes.len()];
        for (key, class) in index {
            keys[class as usize] = key;
        }

        let mut frequencies: Vec<Option<FrequencyTable>> = vec![None; sizes.len()];
        if requirements.sensitive_frequencies {
            if let Some(sensitive) = self.view.sensitive() {
                let mut pairs: Vec<(u32, u32)> = row_classes
                    .iter()
                    .zip(sensitive.codes())
                    .map(|(&class, &code)| (class, code))
                    .collect();
                pairs.sort_unstable();

                let mut per_class: Vec<Vec<(u32, usize)>> = vec![Vec::new(); sizes.len()];
                for run in pairs.chunk_by(|a, b| a == b) {
                    let (class, code) = run[0];
                    per_class[class as usize].push((code, run.len()));
                }
                for (slot, entries) in frequencies.iter_mut().zip(per_class) {
                    *slot = Some(FrequencyTable::new(entries));
                }
            }
        }

        let classes = keys
            .into_iter()
            .zip(sizes)
            .zip(frequencies)
            .enumerate()
            .map(|(id, ((key, size), sensitive))| EquivalenceClass {
                id,
                key,
                size,
                sensitive,
            })
            .collect();

        EquivalenceClasses {
            node,
            classes,
            row_classes: requirements.row_assignment.then_some(row_classes),
            row_count,
        }
    }
}
