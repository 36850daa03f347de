//! Boosting: the forest training loop and weighted-vote inference.

pub mod forest;

pub use forest::{Forest, ForestMember, RoundSummary};
