//! The generalization lattice: every combination of hierarchy levels.

use crate::error::{Result, ShroudError};

use super::node::{NodeId, Transformation};

/// Upper bound on lattice size; the search keeps one tag byte per node.
pub const MAX_NODES: usize = 1 << 32;

/// Structural view of the transformation space.
///
/// Node `(l_1, …, l_q)` generalizes `(m_1, …, m_q)` iff `l_i ≥ m_i` for every
/// dimension. The lattice carries no search state.
#[derive(Debug, Clone)]
pub struct Lattice {
    heights: Vec<usize>,
    strides: Vec<usize>,
    size: usize,
    /// `tail_capacity[d]` is the largest level sum reachable by dimensions `d..`.
    tail_capacity: Vec<usize>,
}

impl Lattice {
    /// Build the lattice for the given hierarchy heights.
    pub fn new(heights: &[usize]) -> Result<Self> {
        if heights.is_empty() {
            return Err(ShroudError::config(
                "lattice",
                "at least one quasi-identifying attribute is required",
            ));
        }
        if let Some(position) = heights.iter().position(|&h| h == 0) {
            return Err(ShroudError::config(
                format!("dimension {}", position),
                "hierarchy height must be at least one",
            ));
        }

        let mut strides = vec![1; heights.len()];
        let mut size: usize = 1;
        for dim in (0..heights.len()).rev() {
            strides[dim] = size;
            size = size
                .checked_mul(heights[dim])
                .filter(|&s| s <= MAX_NODES)
                .ok_or_else(|| {
                    ShroudError::config(
                        "lattice",
                        format!("more than {} transformations; reduce hierarchy heights", MAX_NODES),
                    )
                })?;
        }

        let mut tail_capacity = vec![0; heights.len() + 1];
        for dim in (0..heights.len()).rev() {
            tail_capacity[dim] = tail_capacity[dim + 1] + heights[dim] - 1;
        }

        Ok(Self {
            heights: heights.to_vec(),
            strides,
            size,
            tail_capacity,
        })
    }

    /// Total number of nodes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of quasi-identifiers.
    pub fn dimensions(&self) -> usize {
        self.heights.len()
    }

    /// Hierarchy height per dimension.
    pub fn heights(&self) -> &[usize] {
        &self.heights
    }

    /// Height of the top node (sum of maximum levels).
    pub fn max_height(&self) -> usize {
        self.tail_capacity[0]
    }

    /// The node without any generalization.
    pub fn bottom(&self) -> NodeId {
        NodeId(0)
    }

    /// The node generalizing every attribute to its top level.
    pub fn top(&self) -> NodeId {
        NodeId(self.size - 1)
    }

    /// Level of `node` in `dimension`.
    pub fn level(&self, node: NodeId, dimension: usize) -> usize {
        (node.0 / self.strides[dimension]) % self.heights[dimension]
    }

    /// Full level vector of `node`.
    pub fn levels(&self, node: NodeId) -> Vec<usize> {
        (0..self.dimensions()).map(|d| self.level(node, d)).collect()
    }

    /// Level vector of `node` as a [`Transformation`].
    pub fn transformation(&self, node: NodeId) -> Transformation {
        Transformation::new(self.levels(node))
    }

    /// Identifier of a level vector, if it lies within the lattice.
    pub fn node(&self, levels: &[usize]) -> Option<NodeId> {
        if levels.len() != self.dimensions() {
            return None;
        }
        let mut id = 0;
        for (dim, &level) in levels.iter().enumerate() {
            if level >= self.heights[dim] {
                return None;
            }
            id += level * self.strides[dim];
        }
        Some(NodeId(id))
    }

    /// Sum of levels of `node`.
    pub fn height_of(&self, node: NodeId) -> usize {
        (0..self.dimensions()).map(|d| self.level(node, d)).sum()
    }

    /// All nodes in identifier (lexicographic) order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.size).map(NodeId)
    }

    /// Nodes one generalization step above `node`.
    pub fn successors(&self, node: NodeId) -> Vec<NodeId> {
        (0..self.dimensions())
            .filter(|&d| self.level(node, d) + 1 < self.heights[d])
            .map(|d| NodeId(node.0 + self.strides[d]))
            .collect()
    }

    /// Nodes one generalization step below `node`.
    pub fn predecessors(&self, node: NodeId) -> Vec<NodeId> {
        (0..self.dimensions())
            .filter(|&d| self.level(node, d) > 0)
            .map(|d| NodeId(node.0 - self.strides[d]))
            .collect()
    }

    /// Returns true if `a` generalizes `b` or equals it.
    pub fn generalizes(&self, a: NodeId, b: NodeId) -> bool {
        (0..self.dimensions()).all(|d| self.level(a, d) >= self.level(b, d))
    }

    /// Least common generalization of two nodes (component-wise max).
    pub fn join(&self, a: NodeId, b: NodeId) -> NodeId {
        NodeId(
            (0..self.dimensions())
                .map(|d| self.level(a, d).max(self.level(b, d)) * self.strides[d])
                .sum(),
        )
    }

    /// Greatest common specialization of two nodes (component-wise min).
    pub fn meet(&self, a: NodeId, b: NodeId) -> NodeId {
        NodeId(
            (0..self.dimensions())
                .map(|d| self.level(a, d).min(self.level(b, d)) * self.strides[d])
                .sum(),
        )
    }

    /// Nodes whose levels sum to `height`, in lexicographic order.
    pub fn nodes_at_height(&self, height: usize) -> Vec<NodeId> {
        let mut out = Vec::new();
        if height <= self.max_height() {
            self.collect_at_height(0, height, 0, &mut out);
        }
        out
    }

    fn collect_at_height(&self, dim: usize, remaining: usize, id: usize, out: &mut Vec<NodeId>) {
        if dim == self.dimensions() {
            if remaining == 0 {
                out.push(NodeId(id));
            }
            return;
        }
        let low = remaining.saturating_sub(self.tail_capacity[dim + 1]);
        let high = remaining.min(self.heights[dim] - 1);
        for level in low..=high {
            self.collect_at_height(dim + 1, remaining - level, id + level * self.strides[dim], out);
        }
    }
}
