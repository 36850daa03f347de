//! # decision-forest
//!
//! Signal/background classification with binary decision trees and an
//! AdaBoost-style forest of them.
//!
//! ## Features
//!
//! - **Coarse-to-fine split search**: every feature range is scanned on a
//!   coarse grid, then refined around the best threshold on a fine grid.
//! - **Reversible pruning**: cost-complexity pruning marks subtrees as
//!   suppressed instead of deleting them, so the same tree can be re-pruned
//!   with another penalty.
//! - **Boosting**: each round trains and prunes a tree on the current sample
//!   weights, then boosts the weight of the points it got wrong.
//! - **Parallel Processing**: threshold scoring and batch prediction run on
//!   Rayon when enabled.
//! - **Persistence**: a compact little-endian binary format for trees and
//!   forests, plus tab-separated purity reports.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use decision_forest::{DataSetLoader, Forest, ForestConfigBuilder};
//!
//! # fn main() -> decision_forest::Result<()> {
//! decision_forest::init()?;
//!
//! let loader = DataSetLoader::default();
//! let signal = loader.load_path("signal.tsv")?;
//! let background = loader.load_path("background.tsv")?;
//!
//! let config = ForestConfigBuilder::new().num_rounds(20).alpha(0.01).build()?;
//! let mut forest = Forest::new(config)?;
//! forest.train(&signal, &background)?;
//!
//! let output = forest.run_data_point(&signal.points()[0]);
//! println!("purity of first signal point: {}", output);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: fundamental types, constants, error handling, and traits
//! - [`config`]: training and experiment configuration
//! - [`dataset`]: corpora, sample weights, and the delimited-text loader
//! - [`tree`]: nodes, split search, trees, and the single-cut stump
//! - [`boosting`]: the boosted forest
//! - [`io`]: binary model files and text reports
//! - [`metrics`]: confusion counts and accuracy

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

pub mod core;

pub mod config;

pub mod dataset;

pub mod tree;

pub mod boosting;

pub mod io;

pub mod metrics;

pub use crate::core::{
    constants::*,
    error::{ForestError, Result},
    traits::*,
    types::*,
};

pub use config::{ExperimentConfig, ExperimentKind, ForestConfig, ForestConfigBuilder};

pub use dataset::{read_data_set, DataPoint, DataSet, DataSetLoader, LoaderConfig, SampleWeights};

pub use tree::{
    ClassCounts, DecisionStump, Node, NodeKind, Split, SplitCandidate, SplitFinder,
    SplitFinderConfig, Tree,
};

pub use boosting::{Forest, ForestMember, RoundSummary};

pub use io::{habitable_planet_rule, load_forest, load_tree, save_forest, save_tree};

pub use metrics::{accuracy, evaluate, misclassification_rate, ConfusionCounts};

pub use crate::core::constants::DECISION_FOREST_VERSION as VERSION;

/// Initialize the library.
///
/// Installs the `env_logger` backend on first use; later calls are no-ops.
///
/// ```rust
/// fn main() -> decision_forest::Result<()> {
///     decision_forest::init()?;
///     assert!(decision_forest::is_initialized());
///     Ok(())
/// }
/// ```
pub fn init() -> Result<()> {
    crate::core::initialize_core()
}

/// Check if [`init`] has run.
pub fn is_initialized() -> bool {
    crate::core::is_core_initialized()
}
