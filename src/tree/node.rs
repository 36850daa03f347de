//! Tree node structures.
//!
//! Nodes live in an arena owned by [`Tree`](crate::tree::Tree) and refer to
//! their children by [`NodeIndex`]. A node is either terminal or a branch;
//! a branch may be *suppressed*, in which case it answers every query as if
//! it were terminal while its subtree stays allocated.

use crate::core::traits::FeatureRow;
use crate::core::types::{FeatureIndex, NodeIndex};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw training counts of one node.
///
/// The total is non-zero, so [`purity`](Self::purity) is always defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    signal: u32,
    background: u32,
}

impl ClassCounts {
    /// Returns `None` when both counts are zero.
    pub fn new(signal: u32, background: u32) -> Option<Self> {
        if signal == 0 && background == 0 {
            None
        } else {
            Some(ClassCounts { signal, background })
        }
    }

    /// Signal points that reached the node during training.
    pub fn signal(&self) -> u32 {
        self.signal
    }

    /// Background points that reached the node during training.
    pub fn background(&self) -> u32 {
        self.background
    }

    pub fn total(&self) -> u32 {
        self.signal + self.background
    }

    /// `signal / (signal + background)`.
    pub fn purity(&self) -> f64 {
        self.signal as f64 / self.total() as f64
    }
}

/// A threshold test on one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub feature: FeatureIndex,
    pub threshold: f64,
}

impl Split {
    pub fn new(feature: FeatureIndex, threshold: f64) -> Self {
        Split { feature, threshold }
    }

    /// True when `row` routes to the low child (`value <= threshold`).
    #[inline]
    pub fn goes_low<R: FeatureRow + ?Sized>(&self, row: &R) -> bool {
        row.feature(self.feature) <= self.threshold
    }
}

/// Terminal or branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Terminal,
    Branch {
        split: Split,
        low: NodeIndex,
        high: NodeIndex,
        /// Soft-prune marker, cleared by `Tree::reset_suppression`
        suppressed: bool,
    },
}

/// One arena slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub counts: ClassCounts,
    pub kind: NodeKind,
}

impl Node {
    pub fn terminal(counts: ClassCounts) -> Self {
        Node {
            counts,
            kind: NodeKind::Terminal,
        }
    }

    pub fn branch(counts: ClassCounts, split: Split, low: NodeIndex, high: NodeIndex) -> Self {
        Node {
            counts,
            kind: NodeKind::Branch {
                split,
                low,
                high,
                suppressed: false,
            },
        }
    }

    /// Training purity of the node.
    pub fn purity(&self) -> f64 {
        self.counts.purity()
    }

    /// True for terminals and suppressed branches.
    pub fn is_effectively_terminal(&self) -> bool {
        match self.kind {
            NodeKind::Terminal => true,
            NodeKind::Branch { suppressed, .. } => suppressed,
        }
    }

    /// True only for real terminals, ignoring suppression.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal)
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self.kind, NodeKind::Branch { suppressed: true, .. })
    }

    /// Split of an active branch, `None` for terminals and suppressed branches.
    pub fn active_split(&self) -> Option<(Split, NodeIndex, NodeIndex)> {
        match self.kind {
            NodeKind::Branch {
                split,
                low,
                high,
                suppressed: false,
            } => Some((split, low, high)),
            _ => None,
        }
    }

    /// Children of a branch regardless of suppression.
    pub fn children(&self) -> Option<(NodeIndex, NodeIndex)> {
        match self.kind {
            NodeKind::Terminal => None,
            NodeKind::Branch { low, high, .. } => Some((low, high)),
        }
    }

    pub(crate) fn set_suppressed(&mut self, value: bool) {
        if let NodeKind::Branch { suppressed, .. } = &mut self.kind {
            *suppressed = value;
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Terminal => write!(
                f,
                "terminal s={} b={} purity={:.4}",
                self.counts.signal,
                self.counts.background,
                self.purity()
            ),
            NodeKind::Branch {
                split, suppressed, ..
            } => write!(
                f,
                "x[{}] <= {:.6}{} s={} b={} purity={:.4}",
                split.feature,
                split.threshold,
                if *suppressed { " (suppressed)" } else { "" },
                self.counts.signal,
                self.counts.background,
                self.purity()
            ),
        }
    }
}
