//! Core data types for the decision forest.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Feature index type for identifying a column of the feature vectors.
pub type FeatureIndex = usize;

/// Tree node identifier type (index into a tree's node arena).
pub type NodeIndex = usize;

/// Boosting round number type (1-based in reports and errors).
pub type RoundIndex = usize;

/// Sample weight type used by split scoring and boosting.
pub type Weight = f64;

/// The two classes the forest discriminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Class {
    /// Events of interest; purity near 1.
    Signal,
    /// Everything else; purity near 0.
    Background,
}

impl Class {
    /// Classifies a purity (or forest output) by rounding to the nearest
    /// integer with ties to even, so an output of exactly 0.5 is background.
    pub fn from_purity(purity: f64) -> Self {
        if purity.round_ties_even() == 1.0 {
            Class::Signal
        } else {
            Class::Background
        }
    }

    /// Returns true for [`Class::Signal`].
    pub fn is_signal(self) -> bool {
        self == Class::Signal
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Class::Signal => write!(f, "signal"),
            Class::Background => write!(f, "background"),
        }
    }
}

/// Verbosity levels for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// No output
    Silent,
    /// Warnings only
    Warning,
    /// Per-round progress
    Info,
    /// Split search internals
    Debug,
}

impl VerbosityLevel {
    /// The `log` level filter matching this verbosity.
    pub fn level_filter(self) -> log::LevelFilter {
        match self {
            VerbosityLevel::Silent => log::LevelFilter::Off,
            VerbosityLevel::Warning => log::LevelFilter::Warn,
            VerbosityLevel::Info => log::LevelFilter::Info,
            VerbosityLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

impl Default for VerbosityLevel {
    fn default() -> Self {
        VerbosityLevel::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_from_purity_rounds_ties_to_even() {
        assert_eq!(Class::from_purity(0.5), Class::Background);
        assert_eq!(Class::from_purity(0.5000001), Class::Signal);
        assert_eq!(Class::from_purity(1.0), Class::Signal);
        assert_eq!(Class::from_purity(0.0), Class::Background);
        assert_eq!(Class::from_purity(0.49), Class::Background);
    }

    #[test]
    fn test_class_from_purity_out_of_range() {
        // Forest outputs are not clamped; 1.7 rounds to 2, which is not signal.
        assert_eq!(Class::from_purity(1.7), Class::Background);
        assert_eq!(Class::from_purity(1.2), Class::Signal);
        assert_eq!(Class::from_purity(f64::NAN), Class::Background);
    }

    #[test]
    fn test_verbosity_level_filter() {
        assert_eq!(VerbosityLevel::Silent.level_filter(), log::LevelFilter::Off);
        assert_eq!(VerbosityLevel::Debug.level_filter(), log::LevelFilter::Debug);
        assert!(VerbosityLevel::Warning < VerbosityLevel::Info);
    }
}
