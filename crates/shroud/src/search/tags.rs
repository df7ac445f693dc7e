//! Shared per-node anonymity status.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::lattice::{Lattice, NodeId};

const UNKNOWN: u8 = 0;
const ANONYMOUS: u8 = 1;
const NOT_ANONYMOUS: u8 = 2;

/// Anonymity status of a lattice node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Unknown,
    Anonymous,
    NotAnonymous,
}

impl Tag {
    fn from_raw(raw: u8) -> Self {
        match raw {
            ANONYMOUS => Tag::Anonymous,
            NOT_ANONYMOUS => Tag::NotAnonymous,
            _ => Tag::Unknown,
        }
    }
}

/// One atomic tag per node; tags only ever move away from unknown.
#[derive(Debug)]
pub struct TagStore {
    tags: Vec<AtomicU8>,
}

impl TagStore {
    /// All nodes unknown.
    pub fn new(size: usize) -> Self {
        Self {
            tags: (0..size).map(|_| AtomicU8::new(UNKNOWN)).collect(),
        }
    }

    /// Current tag of `node`.
    pub fn get(&self, node: NodeId) -> Tag {
        Tag::from_raw(self.tags[node.index()].load(Ordering::Acquire))
    }

    /// Set the tag if the node is still unknown. Returns true if this call set it.
    pub fn mark(&self, node: NodeId, anonymous: bool) -> bool {
        let value = if anonymous { ANONYMOUS } else { NOT_ANONYMOUS };
        self.tags[node.index()]
            .compare_exchange(UNKNOWN, value, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record an evaluated verdict and infer it for the generalizations
    /// (anonymous) or specializations (not anonymous) of `node`.
    ///
    /// Returns the number of nodes tagged by inference.
    pub fn record(&self, lattice: &Lattice, node: NodeId, anonymous: bool) -> usize {
        self.mark(node, anonymous);
        let mut inferred = 0;
        let mut stack = neighbours(lattice, node, anonymous);
        while let Some(next) = stack.pop() {
            // a tagged node already has its closure tagged
            if self.mark(next, anonymous) {
                inferred += 1;
                stack.extend(neighbours(lattice, next, anonymous));
            }
        }
        inferred
    }

    /// Number of nodes tagged anonymous.
    #[cfg(test)]
    fn count_anonymous(&self) -> usize {
        self.tags
            .iter()
            .filter(|t| t.load(Ordering::Acquire) == ANONYMOUS)
            .count()
    }
}

fn neighbours(lattice: &Lattice, node: NodeId, upward: bool) -> Vec<NodeId> {
    if upward {
        lattice.successors(node)
    } else {
        lattice.predecessors(node)
    }
}
