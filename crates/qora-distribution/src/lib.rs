//! Sparse weighted distributions over arbitrary orderable types, and their
//! composition into a per-object distribution over whole `State`s
//! (spec.md §4.C4-C5).

mod probability_distribution;
mod state_distribution;

pub use probability_distribution::ProbabilityDistribution;
pub use state_distribution::StateDistribution;
