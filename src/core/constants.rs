//! System constants and training defaults for the decision forest.
//!
//! These values control the split search grid, the stopping floor for tree
//! induction, and the defaults of [`ForestConfig`](crate::config::ForestConfig).

use crate::core::types::VerbosityLevel;

/// Minimum combined signal + background count a node needs before a split
/// is attempted. Evaluated on raw counts, never on weights.
pub const DEFAULT_MIN_SPLIT_COUNT: usize = 55;

/// Number of equal-width bins scanned in the coarse search pass.
pub const DEFAULT_COARSE_BINS: usize = 100;

/// Number of bins scanned in the fine pass around the coarse optimum.
pub const DEFAULT_FINE_BINS: usize = 50;

/// Default cost-complexity penalty per terminal node.
pub const DEFAULT_ALPHA: f64 = 0.01;

/// Default number of boosting rounds (trees in the forest).
pub const DEFAULT_NUM_ROUNDS: usize = 10;

/// Number of bins scanned by the single-cut decision stump.
pub const DEFAULT_STUMP_BINS: usize = 10_000;

/// Default number of threads for parallel processing.
/// 0 means use all available cores.
pub const DEFAULT_NUM_THREADS: usize = 0;

/// Default verbosity level for logging.
pub const DEFAULT_VERBOSITY: VerbosityLevel = VerbosityLevel::Info;

/// Sentinel written as the feature index of terminal records in the binary
/// tree format.
pub const TERMINAL_FEATURE_INDEX: i32 = -1;

/// Header line of the purity report.
pub const PURITY_REPORT_HEADER: &str = "Event\tPurity";

/// Header line of the filtered-index report.
pub const FILTERED_REPORT_HEADER: &str = "Habitable Planet Indexes";

/// Number of feature slots the habitable-planet rule reads.
pub const HABITABLE_RULE_FEATURES: usize = 10;

/// Version information.
pub const DECISION_FOREST_VERSION: &str = env!("CARGO_PKG_VERSION");
