//! Per-sample boosting weights.
//!
//! The boosting loop owns one [`SampleWeights`] and hands it by reference to
//! every tree it trains, so the round-to-round data dependency is explicit
//! instead of hidden in mutable fields of shared samples.

use crate::core::error::Result;
use crate::core::types::{Class, Weight};
use crate::dataset::DataSet;
use crate::ensure;
use crate::dataset_error;
use serde::{Deserialize, Serialize};

/// Weight vectors parallel to a signal and a background corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleWeights {
    signal: Vec<Weight>,
    background: Vec<Weight>,
}

impl SampleWeights {
    /// Uses each point's initial weight.
    pub fn from_datasets(signal: &DataSet, background: &DataSet) -> Self {
        SampleWeights {
            signal: signal.weights(),
            background: background.weights(),
        }
    }

    /// Every sample weighs 1.0.
    pub fn uniform(num_signal: usize, num_background: usize) -> Self {
        SampleWeights {
            signal: vec![1.0; num_signal],
            background: vec![1.0; num_background],
        }
    }

    /// Builds weights from explicit vectors.
    pub fn new(signal: Vec<Weight>, background: Vec<Weight>) -> Self {
        SampleWeights { signal, background }
    }

    /// Weights of the signal corpus.
    pub fn signal(&self) -> &[Weight] {
        &self.signal
    }

    /// Weights of the background corpus.
    pub fn background(&self) -> &[Weight] {
        &self.background
    }

    /// Weights of the corpus holding `class`.
    pub fn of(&self, class: Class) -> &[Weight] {
        match class {
            Class::Signal => &self.signal,
            Class::Background => &self.background,
        }
    }

    /// Mutable weights of the corpus holding `class`.
    pub fn of_mut(&mut self, class: Class) -> &mut [Weight] {
        match class {
            Class::Signal => &mut self.signal,
            Class::Background => &mut self.background,
        }
    }

    /// Sum over both corpora.
    pub fn total(&self) -> Weight {
        self.signal.iter().chain(&self.background).sum()
    }

    /// Divides every weight by the current total so the union sums to 1.
    pub fn normalize(&mut self) -> Result<()> {
        let total = self.total();
        ensure!(
            total.is_finite() && total > 0.0,
            dataset_error!("cannot normalize weights with total {}", total)
        );
        for weight in self.signal.iter_mut().chain(self.background.iter_mut()) {
            *weight /= total;
        }
        Ok(())
    }

    /// Checks that the vectors line up with the corpora and hold no
    /// negative or non-finite values.
    pub fn check_matches(&self, signal: &DataSet, background: &DataSet) -> Result<()> {
        ensure!(
            self.signal.len() == signal.len(),
            dataset_error!(
                "{} signal weights for {} signal points",
                self.signal.len(),
                signal.len()
            )
        );
        ensure!(
            self.background.len() == background.len(),
            dataset_error!(
                "{} background weights for {} background points",
                self.background.len(),
                background.len()
            )
        );
        if let Some(bad) = self
            .signal
            .iter()
            .chain(&self.background)
            .find(|w| !w.is_finite() || **w < 0.0)
        {
            return Err(dataset_error!("invalid sample weight {}", bad));
        }
        Ok(())
    }
}
