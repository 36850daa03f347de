//! Single-cut decision stump.
//!
//! The stump scans a fine equal-width grid on every feature with unit
//! weights and keeps the best-scoring threshold. It answers 1 for rows above
//! the threshold and 0 otherwise.

use crate::core::constants::DEFAULT_STUMP_BINS;
use crate::core::error::{ForestError, Result};
use crate::core::traits::{Classifier, FeatureRow};
use crate::core::types::FeatureIndex;
use crate::dataset::{validate_pair, DataSet, SampleWeights};
use crate::tree::split::{SplitFinder, SplitFinderConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionStump {
    pub feature: FeatureIndex,
    pub threshold: f64,
    /// Purity difference achieved on the training data
    pub score: f64,
}

impl DecisionStump {
    /// Trains with the default grid of 10 000 bins.
    pub fn train(signal: &DataSet, background: &DataSet) -> Result<Self> {
        Self::train_with_bins(signal, background, DEFAULT_STUMP_BINS)
    }

    pub fn train_with_bins(signal: &DataSet, background: &DataSet, bins: usize) -> Result<Self> {
        validate_pair(signal, background)?;
        if bins == 0 {
            return Err(ForestError::invalid_parameter(
                "bins",
                "0",
                "must be at least 1",
            ));
        }

        let weights = SampleWeights::uniform(signal.len(), background.len());
        let finder = SplitFinder::new(
            signal,
            background,
            &weights,
            SplitFinderConfig::single_pass(bins),
        );
        let signal_idx: Vec<usize> = (0..signal.len()).collect();
        let background_idx: Vec<usize> = (0..background.len()).collect();

        let candidate = finder
            .choose_split(&signal_idx, &background_idx)
            .ok_or_else(|| ForestError::training("no threshold separates the corpora"))?;

        log::info!(
            "Stump: x[{}] > {} (score {:.6})",
            candidate.feature,
            candidate.threshold,
            candidate.score
        );

        Ok(DecisionStump {
            feature: candidate.feature,
            threshold: candidate.threshold,
            score: candidate.score,
        })
    }
}

impl Classifier for DecisionStump {
    fn run_data_point<R: FeatureRow + ?Sized>(&self, row: &R) -> f64 {
        if row.feature(self.feature) > self.threshold {
            1.0
        } else {
            0.0
        }
    }

    fn num_features(&self) -> usize {
        self.feature + 1
    }

    fn name(&self) -> &'static str {
        "stump"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataPoint;
    use approx::assert_abs_diff_eq;

    fn corpus(rows: Vec<Vec<f64>>) -> DataSet {
        let names = vec!["a".to_string(), "b".to_string()];
        DataSet::from_points(names, rows.into_iter().map(DataPoint::new).collect()).unwrap()
    }

    #[test]
    fn test_stump_finds_first_best_threshold() {
        let signal = corpus((0..50).map(|i| vec![5.0, i as f64]).collect());
        let background = corpus((0..60).map(|k| vec![5.0, 100.0 - 0.5 * k as f64]).collect());
        let stump = DecisionStump::train(&signal, &background).unwrap();

        // Grid step is 0.01; the first threshold above 48 reaches 60/61.
        assert_eq!(stump.feature, 1);
        assert_abs_diff_eq!(stump.threshold, 48.01, epsilon = 1e-9);
        assert_abs_diff_eq!(stump.score, 60.0 / 61.0, epsilon = 1e-12);
        assert_eq!(stump.run_data_point(&[5.0, 90.0][..]), 1.0);
        assert_eq!(stump.run_data_point(&[5.0, 10.0][..]), 0.0);
    }

    #[test]
    fn test_stump_ignores_count_floor() {
        let signal = corpus(vec![vec![1.0, 0.0], vec![2.0, 0.0], vec![5.0, 0.0]]);
        let background = corpus(vec![vec![3.0, 0.0], vec![10.0, 0.0], vec![11.0, 0.0]]);
        let stump = DecisionStump::train_with_bins(&signal, &background, 100).unwrap();
        assert_eq!(stump.feature, 0);
        assert!(stump.score > 0.0 && stump.score < 1.0);
    }

    #[test]
    fn test_stump_without_usable_threshold() {
        let signal = corpus(vec![vec![1.0, 1.0]]);
        let background = corpus(vec![vec![1.0, 1.0]]);
        assert!(DecisionStump::train(&signal, &background).is_err());
        assert!(DecisionStump::train_with_bins(&signal, &background, 0).is_err());
    }
}
