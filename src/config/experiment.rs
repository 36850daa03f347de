//! Experiment description consumed by the `forest_experiment` binary.

use crate::config::core::ForestConfig;
use crate::core::error::{ForestError, Result};
use crate::ensure;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which model an experiment trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentKind {
    /// One threshold on one feature, unweighted
    Stump,
    /// A single pruned tree
    Tree,
    /// A boosted forest
    Forest,
}

impl Default for ExperimentKind {
    fn default() -> Self {
        ExperimentKind::Forest
    }
}

/// Inputs, outputs and model settings of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub kind: ExperimentKind,
    /// Signal training corpus
    pub signal_path: PathBuf,
    /// Background training corpus
    pub background_path: PathBuf,
    /// Corpus to classify
    pub data_path: PathBuf,
    /// Purity report destination
    pub output_path: PathBuf,
    /// Filtered-index report destination (forest runs only)
    #[serde(default)]
    pub filtered_output_path: Option<PathBuf>,
    /// Binary model destination (tree and forest runs)
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Field delimiter of the corpus files
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub forest: ForestConfig,
}

fn default_delimiter() -> char {
    '\t'
}

impl ExperimentConfig {
    /// Loads an experiment from a `.toml` or `.json` file.
    ///
    /// Relative paths inside the file are resolved against the file's
    /// directory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ForestError::config(format!(
                "Failed to read experiment file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config: ExperimentConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => toml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(ForestError::config(
                    "Unsupported experiment file format. Use .json or .toml",
                ))
            }
        };

        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Checks the paths and the nested forest settings.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.delimiter.is_ascii(),
            ForestError::invalid_parameter(
                "delimiter",
                self.delimiter.to_string(),
                "must be a single ASCII character",
            )
        );
        for (name, path) in [
            ("signal_path", &self.signal_path),
            ("background_path", &self.background_path),
            ("data_path", &self.data_path),
            ("output_path", &self.output_path),
        ] {
            ensure!(
                !path.as_os_str().is_empty(),
                ForestError::invalid_parameter(name, "", "must not be empty")
            );
        }
        self.forest.validate()
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() && !path.as_os_str().is_empty() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.signal_path);
        resolve(&mut self.background_path);
        resolve(&mut self.data_path);
        resolve(&mut self.output_path);
        if let Some(path) = self.filtered_output_path.as_mut() {
            resolve(path);
        }
        if let Some(path) = self.model_path.as_mut() {
            resolve(path);
        }
    }
}
