//! Dataset management module for the decision forest.
//!
//! Provides the sample and corpus types, the explicit per-sample boosting
//! weights, and the delimited-text loader.

pub mod dataset;
pub mod loader;
pub mod weights;

pub use dataset::{validate_pair, DataPoint, DataSet};
pub use loader::{read_data_set, DataSetLoader, LoaderConfig};
pub use weights::SampleWeights;
