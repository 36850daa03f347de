//! Configuration for tree induction, boosting, and experiment runs.
//!
//! [`ForestConfig`] carries the training parameters; [`ExperimentConfig`]
//! wraps it with the file locations used by the `forest_experiment` binary.

pub mod core;
pub mod experiment;

pub use self::core::{ForestConfig, ForestConfigBuilder};
pub use experiment::{ExperimentConfig, ExperimentKind};

/// Default experiment file looked up by the binary when no path is given.
pub const DEFAULT_EXPERIMENT_FILE: &str = "experiment.toml";
