//! Tree learning module.
//!
//! This module provides the node arena, the coarse-to-fine split search,
//! the prunable [`Tree`], and the single-cut [`DecisionStump`].

pub mod node;
pub mod split;
pub mod stump;
pub mod tree;

pub use node::{ClassCounts, Node, NodeKind, Split};
pub use split::{SplitCandidate, SplitFinder, SplitFinderConfig};
pub use stump::DecisionStump;
pub use tree::Tree;
