//! Lattice search for the optimal anonymous transformation.

mod engine;
mod tags;

pub use engine::{
    Candidate, SearchConfig, SearchEngine, SearchOutcome, SearchStatistics, SearchStrategy,
};
pub use tags::{Tag, TagStore};
