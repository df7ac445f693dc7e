//! Transformation lattice over quasi-identifier hierarchy levels.

#[allow(clippy::module_inception)]
mod lattice;
mod node;

pub use lattice::{Lattice, MAX_NODES};
pub use node::{NodeId, Transformation};
