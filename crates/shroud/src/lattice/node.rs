//! Lattice node identifiers and level vectors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dense identifier of a lattice node.
///
/// Identifiers are a mixed-radix encoding of the level vector with the first
/// quasi-identifier most significant, so comparing identifiers compares level
/// vectors lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the lattice's enumeration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Generalization level of each quasi-identifier, in column order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transformation {
    levels: Vec<usize>,
}

impl Transformation {
    /// Wrap a level vector.
    pub fn new(levels: Vec<usize>) -> Self {
        Self { levels }
    }

    /// Level of each quasi-identifier.
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    /// Level of one quasi-identifier.
    pub fn level(&self, dimension: usize) -> usize {
        self.levels[dimension]
    }

    /// Sum of levels (the node's height in the lattice).
    pub fn total(&self) -> usize {
        self.levels.iter().sum()
    }

    /// Returns true if `self` generalizes `other` or equals it.
    pub fn generalizes(&self, other: &Transformation) -> bool {
        self.levels.len() == other.levels.len()
            && self.levels.iter().zip(&other.levels).all(|(a, b)| a >= b)
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, level) in self.levels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", level)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Transformation {
    fn from(levels: Vec<usize>) -> Self {
        Self::new(levels)
    }
}
