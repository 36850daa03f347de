//! Error handling and error types for the decision forest.
//!
//! All fallible operations return [`Result`], whose error type covers corpus
//! validation, configuration, boosting, model serialization, and the I/O of
//! the loader and report collaborators.

use crate::core::types::RoundIndex;
use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum ForestError {
    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Dataset-related errors
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// A sample whose feature vector length disagrees with its corpus
    #[error(
        "Feature count mismatch in {corpus} corpus at point {index}: expected {expected}, got {actual}"
    )]
    FeatureCountMismatch {
        corpus: String,
        index: usize,
        expected: usize,
        actual: usize,
    },

    /// Training was requested with no samples at all
    #[error("Training requires at least one signal or background point")]
    EmptyTrainingData,

    /// Data loading and parsing errors
    #[error("Data loading error: {message}")]
    DataLoading { message: String },

    /// A boosting round whose weighted error makes the vote weight undefined
    #[error(
        "Degenerate training round {round}: weighted error {error_weight} gives tree weight {tree_weight}"
    )]
    DegenerateRound {
        round: RoundIndex,
        error_weight: f64,
        tree_weight: f64,
    },

    /// Training-related errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Prediction errors
    #[error("Prediction error: {message}")]
    Prediction { message: String },

    /// Model serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// CSV parsing errors
    #[error("CSV parsing error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// TOML parsing errors
    #[error("TOML error: {source}")]
    Toml {
        #[from]
        source: toml::de::Error,
    },

    /// Bincode serialization errors
    #[error("Bincode error: {source}")]
    Bincode {
        #[from]
        source: bincode::Error,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },
}

/// Type alias for Results using ForestError
pub type Result<T> = std::result::Result<T, ForestError>;

impl ForestError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ForestError::Config {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        ForestError::Dataset {
            message: message.into(),
        }
    }

    /// Create a feature count mismatch error
    pub fn feature_count_mismatch<S: Into<String>>(
        corpus: S,
        index: usize,
        expected: usize,
        actual: usize,
    ) -> Self {
        ForestError::FeatureCountMismatch {
            corpus: corpus.into(),
            index,
            expected,
            actual,
        }
    }

    /// Create a data loading error
    pub fn data_loading<S: Into<String>>(message: S) -> Self {
        ForestError::DataLoading {
            message: message.into(),
        }
    }

    /// Create a degenerate boosting round error
    pub fn degenerate_round(round: RoundIndex, error_weight: f64, tree_weight: f64) -> Self {
        ForestError::DegenerateRound {
            round,
            error_weight,
            tree_weight,
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        ForestError::Training {
            message: message.into(),
        }
    }

    /// Create a prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        ForestError::Prediction {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        ForestError::Serialization {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        ForestError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            ForestError::Config { .. } => false,
            ForestError::Dataset { .. } => false,
            ForestError::FeatureCountMismatch { .. } => false,
            ForestError::EmptyTrainingData => false,
            ForestError::DataLoading { .. } => false,
            ForestError::DegenerateRound { .. } => true,
            ForestError::Training { .. } => true,
            ForestError::Prediction { .. } => true,
            ForestError::Serialization { .. } => false,
            ForestError::IO { .. } => false,
            ForestError::Csv { .. } => false,
            ForestError::Json { .. } => false,
            ForestError::Toml { .. } => false,
            ForestError::Bincode { .. } => false,
            ForestError::InvalidParameter { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ForestError::Config { .. } => "config",
            ForestError::Dataset { .. } => "dataset",
            ForestError::FeatureCountMismatch { .. } => "feature_count_mismatch",
            ForestError::EmptyTrainingData => "empty_training_data",
            ForestError::DataLoading { .. } => "data_loading",
            ForestError::DegenerateRound { .. } => "degenerate_round",
            ForestError::Training { .. } => "training",
            ForestError::Prediction { .. } => "prediction",
            ForestError::Serialization { .. } => "serialization",
            ForestError::IO { .. } => "io",
            ForestError::Csv { .. } => "csv",
            ForestError::Json { .. } => "json",
            ForestError::Toml { .. } => "toml",
            ForestError::Bincode { .. } => "bincode",
            ForestError::InvalidParameter { .. } => "invalid_parameter",
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::ForestError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ForestError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! dataset_error {
    ($msg:expr) => {
        $crate::core::error::ForestError::dataset($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ForestError::dataset(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! serialization_error {
    ($msg:expr) => {
        $crate::core::error::ForestError::serialization($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ForestError::serialization(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = ForestError::config("test configuration error");
        assert_eq!(err.category(), "config");
        assert!(!err.is_recoverable());

        let err = ForestError::training("test training error");
        assert_eq!(err.category(), "training");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_macros() {
        let err = config_error!("test error");
        assert!(matches!(err, ForestError::Config { .. }));

        let err = dataset_error!("test error with param: {}", 42);
        assert!(matches!(err, ForestError::Dataset { .. }));

        let err = serialization_error!("bad record {}", 3);
        assert_eq!(err.category(), "serialization");
    }

    #[test]
    fn test_feature_count_mismatch_display() {
        let err = ForestError::feature_count_mismatch("signal", 7, 3, 2);
        let message = err.to_string();
        assert!(message.contains("signal"));
        assert!(message.contains("point 7"));
        assert!(message.contains("expected 3, got 2"));
    }

    #[test]
    fn test_degenerate_round() {
        let err = ForestError::degenerate_round(1, 0.0, f64::INFINITY);
        assert_eq!(err.category(), "degenerate_round");
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("round 1"));
    }

    #[test]
    fn test_parameter_errors() {
        let err = ForestError::invalid_parameter("alpha", "-0.5", "must be non-negative");
        assert_eq!(err.category(), "invalid_parameter");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let forest_err: ForestError = io_err.into();
        assert!(matches!(forest_err, ForestError::IO { .. }));
        assert_eq!(forest_err.category(), "io");
    }
}
