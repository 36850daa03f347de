//! Coarse-to-fine threshold search.
//!
//! For every feature the finder scans an equal-width grid between the
//! feature's minimum and maximum over the node's points, then rescans a
//! narrower grid centered on the best threshold found so far. The running
//! best is shared by all features: a later feature only wins with a strictly
//! higher score, and the fine window of every feature is centered on the
//! overall best threshold, whichever feature it came from.
//!
//! A threshold `t` is scored on the weighted masses with value `>= t` (high)
//! and `< t` (low) as `|sigFrac(high) - sigFrac(low)|`. Scores of exactly 1
//! are rejected.

use crate::config::ForestConfig;
use crate::core::constants::{DEFAULT_COARSE_BINS, DEFAULT_FINE_BINS, DEFAULT_MIN_SPLIT_COUNT};
use crate::core::types::{FeatureIndex, Weight};
use crate::dataset::{DataSet, SampleWeights};
use crate::tree::node::Split;
use rayon::prelude::*;

/// Search grid and stopping floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitFinderConfig {
    /// Nodes with fewer raw points than this are never split
    pub min_split_count: usize,
    pub coarse_bins: usize,
    /// Bins of the second pass; 0 skips it
    pub fine_bins: usize,
    /// Score the thresholds of one pass on the rayon pool
    pub parallel: bool,
}

impl Default for SplitFinderConfig {
    fn default() -> Self {
        SplitFinderConfig {
            min_split_count: DEFAULT_MIN_SPLIT_COUNT,
            coarse_bins: DEFAULT_COARSE_BINS,
            fine_bins: DEFAULT_FINE_BINS,
            parallel: false,
        }
    }
}

impl SplitFinderConfig {
    /// One pass over `bins` thresholds with no count floor.
    pub fn single_pass(bins: usize) -> Self {
        SplitFinderConfig {
            min_split_count: 0,
            coarse_bins: bins,
            fine_bins: 0,
            parallel: false,
        }
    }
}

impl From<&ForestConfig> for SplitFinderConfig {
    fn from(config: &ForestConfig) -> Self {
        SplitFinderConfig {
            min_split_count: config.min_split_count,
            coarse_bins: config.coarse_bins,
            fine_bins: config.fine_bins,
            parallel: config.parallel_split_search,
        }
    }
}

/// The accepted split with its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    pub feature: FeatureIndex,
    pub threshold: f64,
    pub score: f64,
}

impl SplitCandidate {
    pub fn split(&self) -> Split {
        Split::new(self.feature, self.threshold)
    }
}

/// Running best of one search, shared across all features.
#[derive(Debug, Clone, Copy)]
struct RunningBest {
    feature: FeatureIndex,
    threshold: f64,
    score: f64,
    accepted: bool,
}

impl RunningBest {
    fn new() -> Self {
        RunningBest {
            feature: 0,
            threshold: 0.0,
            score: 0.0,
            accepted: false,
        }
    }

    fn offer(&mut self, feature: FeatureIndex, threshold: f64, score: f64) {
        if score > self.score && score < 1.0 {
            self.feature = feature;
            self.threshold = threshold;
            self.score = score;
            self.accepted = true;
        }
    }
}

/// Weighted masses on each side of one threshold.
#[derive(Debug, Default, Clone, Copy)]
struct SideMasses {
    signal_high: Weight,
    signal_low: Weight,
    background_high: Weight,
    background_low: Weight,
}

impl SideMasses {
    fn score(&self) -> Option<f64> {
        let high = self.signal_high + self.background_high;
        let low = self.signal_low + self.background_low;
        if high > 0.0 && low > 0.0 {
            Some((self.signal_high / high - self.signal_low / low).abs())
        } else {
            None
        }
    }
}

/// Split search over index subsets of a signal and a background corpus.
#[derive(Debug, Clone, Copy)]
pub struct SplitFinder<'a> {
    signal: &'a DataSet,
    background: &'a DataSet,
    weights: &'a SampleWeights,
    config: SplitFinderConfig,
}

impl<'a> SplitFinder<'a> {
    pub fn new(
        signal: &'a DataSet,
        background: &'a DataSet,
        weights: &'a SampleWeights,
        config: SplitFinderConfig,
    ) -> Self {
        SplitFinder {
            signal,
            background,
            weights,
            config,
        }
    }

    pub fn config(&self) -> &SplitFinderConfig {
        &self.config
    }

    /// Finds the best split of the points named by `signal_idx` and
    /// `background_idx`, or `None` when the node should stay terminal.
    pub fn choose_split(
        &self,
        signal_idx: &[usize],
        background_idx: &[usize],
    ) -> Option<SplitCandidate> {
        if signal_idx.is_empty()
            || background_idx.is_empty()
            || signal_idx.len() + background_idx.len() < self.config.min_split_count
        {
            return None;
        }

        let num_features = self.signal.points()[signal_idx[0]].num_features();
        let mut best = RunningBest::new();

        for feature in 0..num_features {
            let (min, max) = self.value_range(feature, signal_idx, background_idx);

            let coarse_width = (max - min) / self.config.coarse_bins as f64;
            self.scan(
                feature,
                min,
                coarse_width,
                self.config.coarse_bins,
                signal_idx,
                background_idx,
                &mut best,
            );

            if self.config.fine_bins == 0 {
                continue;
            }
            let fine_min = best.threshold - coarse_width;
            let fine_max = best.threshold + coarse_width;
            let fine_width = (fine_max - fine_min) / self.config.fine_bins as f64;
            self.scan(
                feature,
                fine_min,
                fine_width,
                self.config.fine_bins,
                signal_idx,
                background_idx,
                &mut best,
            );
        }

        if !best.accepted {
            log::debug!(
                "No usable split for {} signal / {} background points",
                signal_idx.len(),
                background_idx.len()
            );
            return None;
        }

        log::debug!(
            "Split x[{}] <= {} (score {:.6}) for {} signal / {} background points",
            best.feature,
            best.threshold,
            best.score,
            signal_idx.len(),
            background_idx.len()
        );

        Some(SplitCandidate {
            feature: best.feature,
            threshold: best.threshold,
            score: best.score,
        })
    }

    fn value_range(
        &self,
        feature: FeatureIndex,
        signal_idx: &[usize],
        background_idx: &[usize],
    ) -> (f64, f64) {
        let values = signal_idx
            .iter()
            .map(|&i| self.signal.points()[i].features[feature])
            .chain(
                background_idx
                    .iter()
                    .map(|&i| self.background.points()[i].features[feature]),
            );

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            if value < min {
                min = value;
            }
            if value > max {
                max = value;
            }
        }
        (min, max)
    }

    #[allow(clippy::too_many_arguments)]
    fn scan(
        &self,
        feature: FeatureIndex,
        start: f64,
        width: f64,
        bins: usize,
        signal_idx: &[usize],
        background_idx: &[usize],
        best: &mut RunningBest,
    ) {
        let threshold = |i: usize| start + i as f64 * width;

        if self.config.parallel {
            let scores: Vec<Option<f64>> = (0..bins)
                .into_par_iter()
                .map(|i| {
                    self.masses(feature, threshold(i), signal_idx, background_idx)
                        .score()
                })
                .collect();
            // Applied in threshold order so ties resolve as in the serial scan.
            for (i, score) in scores.into_iter().enumerate() {
                if let Some(score) = score {
                    best.offer(feature, threshold(i), score);
                }
            }
        } else {
            for i in 0..bins {
                let t = threshold(i);
                if let Some(score) = self.masses(feature, t, signal_idx, background_idx).score() {
                    best.offer(feature, t, score);
                }
            }
        }
    }

    fn masses(
        &self,
        feature: FeatureIndex,
        threshold: f64,
        signal_idx: &[usize],
        background_idx: &[usize],
    ) -> SideMasses {
        let mut masses = SideMasses::default();

        let signal_weights = self.weights.signal();
        for &i in signal_idx {
            let value = self.signal.points()[i].features[feature];
            if value >= threshold {
                masses.signal_high += signal_weights[i];
            } else if value < threshold {
                masses.signal_low += signal_weights[i];
            }
        }

        let background_weights = self.weights.background();
        for &i in background_idx {
            let value = self.background.points()[i].features[feature];
            if value >= threshold {
                masses.background_high += background_weights[i];
            } else if value < threshold {
                masses.background_low += background_weights[i];
            }
        }

        masses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataPoint;
    use approx::assert_abs_diff_eq;

    fn corpus(rows: Vec<Vec<f64>>) -> DataSet {
        let names = (0..rows.first().map_or(0, Vec::len))
            .map(|i| format!("x{}", i))
            .collect();
        DataSet::from_points(names, rows.into_iter().map(DataPoint::new).collect()).unwrap()
    }

    fn all(data: &DataSet) -> Vec<usize> {
        (0..data.len()).collect()
    }

    /// Signals at 0..=49, background at 100 down to 70.5, plus a constant column.
    fn separable() -> (DataSet, DataSet) {
        let signal = corpus((0..50).map(|i| vec![5.0, i as f64]).collect());
        let background = corpus((0..60).map(|k| vec![5.0, 100.0 - 0.5 * k as f64]).collect());
        (signal, background)
    }

    #[test]
    fn test_count_floor() {
        let signal = corpus(vec![vec![1.0], vec![2.0], vec![3.0]]);
        let background = corpus(vec![vec![10.0], vec![11.0], vec![12.0]]);
        let weights = SampleWeights::uniform(3, 3);
        let finder =
            SplitFinder::new(&signal, &background, &weights, SplitFinderConfig::default());
        assert!(finder.choose_split(&all(&signal), &all(&background)).is_none());
    }

    #[test]
    fn test_empty_side_never_splits() {
        let (signal, background) = separable();
        let weights = SampleWeights::uniform(signal.len(), background.len());
        let finder =
            SplitFinder::new(&signal, &background, &weights, SplitFinderConfig::default());
        assert!(finder.choose_split(&all(&signal), &[]).is_none());
        assert!(finder.choose_split(&[], &all(&background)).is_none());
    }

    #[test]
    fn test_separable_feature_is_chosen() {
        let (signal, background) = separable();
        let weights = SampleWeights::uniform(signal.len(), background.len());
        let finder =
            SplitFinder::new(&signal, &background, &weights, SplitFinderConfig::default());

        let best = finder
            .choose_split(&all(&signal), &all(&background))
            .unwrap();
        assert_eq!(best.feature, 1);
        assert_abs_diff_eq!(best.threshold, 49.0, epsilon = 1e-12);
        assert_abs_diff_eq!(best.score, 60.0 / 61.0, epsilon = 1e-12);

        let (low, high) = signal.partition(&all(&signal), best.feature, best.threshold);
        assert_eq!((low.len(), high.len()), (50, 0));
        let (low, high) = background.partition(&all(&background), best.feature, best.threshold);
        assert_eq!((low.len(), high.len()), (0, 60));
    }

    #[test]
    fn test_perfect_scores_are_rejected() {
        // Every grid threshold between the classes scores exactly 1.
        let signal = corpus((0..30).map(|_| vec![0.0]).collect());
        let background = corpus((0..30).map(|_| vec![1.0]).collect());
        let weights = SampleWeights::uniform(30, 30);
        let finder =
            SplitFinder::new(&signal, &background, &weights, SplitFinderConfig::default());
        assert!(finder.choose_split(&all(&signal), &all(&background)).is_none());
    }

    #[test]
    fn test_running_best_is_kept_across_features() {
        // Feature 0 is the strong separator; feature 1 is weaker and comes later.
        let signal = corpus(
            (0..40)
                .map(|i| vec![i as f64, (i % 7) as f64])
                .collect(),
        );
        let background = corpus(
            (0..40)
                .map(|i| vec![30.0 + i as f64, (i % 5) as f64 + 1.0])
                .collect(),
        );
        let weights = SampleWeights::uniform(40, 40);
        let finder =
            SplitFinder::new(&signal, &background, &weights, SplitFinderConfig::default());
        let best = finder
            .choose_split(&all(&signal), &all(&background))
            .unwrap();
        assert_eq!(best.feature, 0);
        assert!(best.score > 0.5);
    }

    #[test]
    fn test_weights_change_the_scores() {
        let (signal, background) = separable();
        let uniform = SampleWeights::uniform(signal.len(), background.len());
        let mut skewed = uniform.clone();
        skewed.of_mut(crate::core::types::Class::Signal)[49] = 50.0;

        let config = SplitFinderConfig::default();
        let a = SplitFinder::new(&signal, &background, &uniform, config)
            .choose_split(&all(&signal), &all(&background))
            .unwrap();
        let b = SplitFinder::new(&signal, &background, &skewed, config)
            .choose_split(&all(&signal), &all(&background))
            .unwrap();
        assert!(a.score != b.score);
    }

    #[test]
    fn test_parallel_scan_matches_serial() {
        let signal = corpus(
            (0..80)
                .map(|i| {
                    let x = i as f64;
                    vec![(x * 0.37).sin() * 10.0, x % 13.0, (x * 1.7).cos()]
                })
                .collect(),
        );
        let background = corpus(
            (0..90)
                .map(|i| {
                    let x = i as f64;
                    vec![(x * 0.41).cos() * 12.0 + 3.0, x % 11.0 + 2.0, (x * 0.9).sin()]
                })
                .collect(),
        );
        let weights = SampleWeights::uniform(signal.len(), background.len());

        let serial = SplitFinder::new(&signal, &background, &weights, SplitFinderConfig::default())
            .choose_split(&all(&signal), &all(&background));
        let parallel = SplitFinder::new(
            &signal,
            &background,
            &weights,
            SplitFinderConfig {
                parallel: true,
                ..SplitFinderConfig::default()
            },
        )
        .choose_split(&all(&signal), &all(&background));

        assert_eq!(serial, parallel);
    }
}
