//! Core configuration structure and builder for forest training.

use crate::core::constants::*;
use crate::core::error::{ForestError, Result};
use crate::core::types::VerbosityLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Training parameters for trees and the boosted forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of boosting rounds (trees)
    pub num_rounds: usize,
    /// Cost-complexity penalty per terminal node used when pruning
    pub alpha: f64,
    /// Minimum combined raw point count required to attempt a split
    pub min_split_count: usize,
    /// Bins scanned by the coarse search pass
    pub coarse_bins: usize,
    /// Bins scanned by the fine search pass
    pub fine_bins: usize,
    /// Score candidate thresholds of one pass on the rayon pool
    pub parallel_split_search: bool,
    /// Threads for the rayon pool (0 = all cores)
    pub num_threads: usize,
    /// Verbosity level for logging
    pub verbosity: VerbosityLevel,
}

impl Default for ForestConfig {
    fn default() -> Self {
        ForestConfig {
            num_rounds: DEFAULT_NUM_ROUNDS,
            alpha: DEFAULT_ALPHA,
            min_split_count: DEFAULT_MIN_SPLIT_COUNT,
            coarse_bins: DEFAULT_COARSE_BINS,
            fine_bins: DEFAULT_FINE_BINS,
            parallel_split_search: false,
            num_threads: DEFAULT_NUM_THREADS,
            verbosity: DEFAULT_VERBOSITY,
        }
    }
}

impl ForestConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.num_rounds == 0 {
            return Err(ForestError::invalid_parameter(
                "num_rounds",
                self.num_rounds.to_string(),
                "must be at least 1",
            ));
        }

        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ForestError::invalid_parameter(
                "alpha",
                self.alpha.to_string(),
                "must be finite and non-negative",
            ));
        }

        if self.min_split_count < 2 {
            return Err(ForestError::invalid_parameter(
                "min_split_count",
                self.min_split_count.to_string(),
                "must be at least 2",
            ));
        }

        if self.coarse_bins == 0 {
            return Err(ForestError::invalid_parameter(
                "coarse_bins",
                self.coarse_bins.to_string(),
                "must be at least 1",
            ));
        }

        if self.fine_bins == 0 {
            return Err(ForestError::invalid_parameter(
                "fine_bins",
                self.fine_bins.to_string(),
                "must be at least 1",
            ));
        }

        if self.num_threads > num_cpus::get() * 2 {
            log::warn!(
                "num_threads ({}) is much larger than available cores ({})",
                self.num_threads,
                num_cpus::get()
            );
        }

        Ok(())
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ForestError::config(format!("Failed to read config file: {}", e)))?;

        let config: ForestConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| ForestError::config(format!("Failed to parse JSON config: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| ForestError::config(format!("Failed to parse TOML config: {}", e)))?,
            _ => {
                return Err(ForestError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| ForestError::config(format!("Failed to serialize to JSON: {}", e)))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| ForestError::config(format!("Failed to serialize to TOML: {}", e)))?,
            _ => {
                return Err(ForestError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| ForestError::config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Apply `DECISION_FOREST_*` environment variable overrides
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup (environment-style keys)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("DECISION_FOREST_NUM_ROUNDS") {
            self.num_rounds = val
                .parse()
                .map_err(|_| ForestError::config("Invalid DECISION_FOREST_NUM_ROUNDS"))?;
        }

        if let Some(val) = lookup("DECISION_FOREST_ALPHA") {
            self.alpha = val
                .parse()
                .map_err(|_| ForestError::config("Invalid DECISION_FOREST_ALPHA"))?;
        }

        if let Some(val) = lookup("DECISION_FOREST_MIN_SPLIT_COUNT") {
            self.min_split_count = val
                .parse()
                .map_err(|_| ForestError::config("Invalid DECISION_FOREST_MIN_SPLIT_COUNT"))?;
        }

        if let Some(val) = lookup("DECISION_FOREST_NUM_THREADS") {
            self.num_threads = val
                .parse()
                .map_err(|_| ForestError::config("Invalid DECISION_FOREST_NUM_THREADS"))?;
        }

        self.validate()
    }

    /// Get the effective number of threads (0 means use all available cores)
    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }

    /// Builds the rayon pool used for parallel split scoring and batch prediction.
    pub fn build_thread_pool(&self) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.effective_num_threads())
            .build()
            .map_err(|e| ForestError::config(format!("Failed to build thread pool: {}", e)))
    }

    /// Flat parameter map, used for logging a run's settings
    pub fn as_parameter_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("num_rounds".to_string(), self.num_rounds.to_string());
        map.insert("alpha".to_string(), self.alpha.to_string());
        map.insert("min_split_count".to_string(), self.min_split_count.to_string());
        map.insert("coarse_bins".to_string(), self.coarse_bins.to_string());
        map.insert("fine_bins".to_string(), self.fine_bins.to_string());
        map.insert(
            "parallel_split_search".to_string(),
            self.parallel_split_search.to_string(),
        );
        map.insert("num_threads".to_string(), self.num_threads.to_string());
        map
    }
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct ForestConfigBuilder {
    config: ForestConfig,
    validation_errors: Vec<String>,
}

impl ForestConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        ForestConfigBuilder {
            config: ForestConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the number of boosting rounds
    pub fn num_rounds(mut self, rounds: usize) -> Self {
        if rounds == 0 {
            self.validation_errors
                .push("num_rounds must be at least 1".to_string());
        }
        self.config.num_rounds = rounds;
        self
    }

    /// Set the pruning penalty
    pub fn alpha(mut self, alpha: f64) -> Self {
        if !alpha.is_finite() || alpha < 0.0 {
            self.validation_errors
                .push("alpha must be finite and non-negative".to_string());
        }
        self.config.alpha = alpha;
        self
    }

    /// Set the split stopping floor
    pub fn min_split_count(mut self, count: usize) -> Self {
        if count < 2 {
            self.validation_errors
                .push("min_split_count must be at least 2".to_string());
        }
        self.config.min_split_count = count;
        self
    }

    /// Set the coarse and fine bin counts of the split search
    pub fn search_bins(mut self, coarse: usize, fine: usize) -> Self {
        if coarse == 0 || fine == 0 {
            self.validation_errors
                .push("search bin counts must be at least 1".to_string());
        }
        self.config.coarse_bins = coarse;
        self.config.fine_bins = fine;
        self
    }

    /// Enable parallel scoring of candidate thresholds
    pub fn parallel_split_search(mut self, enabled: bool) -> Self {
        self.config.parallel_split_search = enabled;
        self
    }

    /// Set number of threads
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = threads;
        self
    }

    /// Set verbosity level
    pub fn verbosity(mut self, verbosity: VerbosityLevel) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ForestConfig> {
        if !self.validation_errors.is_empty() {
            return Err(ForestError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ForestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = ForestConfig::default();
        assert_eq!(config.num_rounds, DEFAULT_NUM_ROUNDS);
        assert_eq!(config.alpha, DEFAULT_ALPHA);
        assert_eq!(config.min_split_count, 55);
        assert_eq!(config.coarse_bins, 100);
        assert_eq!(config.fine_bins, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ForestConfig::default();
        config.alpha = -0.1;
        assert!(config.validate().is_err());

        config.alpha = 0.01;
        config.num_rounds = 0;
        assert!(config.validate().is_err());

        config.num_rounds = 3;
        config.min_split_count = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ForestConfigBuilder::new()
            .num_rounds(4)
            .alpha(0.05)
            .min_split_count(20)
            .search_bins(40, 20)
            .parallel_split_search(true)
            .build()
            .unwrap();

        assert_eq!(config.num_rounds, 4);
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.min_split_count, 20);
        assert_eq!(config.coarse_bins, 40);
        assert_eq!(config.fine_bins, 20);
        assert!(config.parallel_split_search);
    }

    #[test]
    fn test_config_builder_validation() {
        let result = ForestConfigBuilder::new().num_rounds(0).alpha(f64::NAN).build();
        let message = result.unwrap_err().to_string();
        assert!(message.contains("num_rounds"));
        assert!(message.contains("alpha"));
    }

    #[test]
    fn test_overrides() {
        let mut config = ForestConfig::default();
        config
            .apply_overrides(|key| match key {
                "DECISION_FOREST_NUM_ROUNDS" => Some("7".to_string()),
                "DECISION_FOREST_ALPHA" => Some("0.2".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.num_rounds, 7);
        assert_eq!(config.alpha, 0.2);

        let bad = config.apply_overrides(|key| {
            (key == "DECISION_FOREST_MIN_SPLIT_COUNT").then(|| "many".to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = ForestConfigBuilder::new().num_rounds(3).alpha(0.0).build().unwrap();

        for name in ["forest.toml", "forest.json"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            assert_eq!(ForestConfig::load_from_file(&path).unwrap(), config);
        }

        assert!(config.save_to_file(dir.path().join("forest.yaml")).is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ForestConfig = toml::from_str("num_rounds = 2").unwrap();
        assert_eq!(config.num_rounds, 2);
        assert_eq!(config.min_split_count, DEFAULT_MIN_SPLIT_COUNT);
    }

    #[test]
    fn test_parameter_map() {
        let map = ForestConfig::default().as_parameter_map();
        assert_eq!(map.get("min_split_count").unwrap(), "55");
        assert!(map.contains_key("alpha"));
    }
}
