//! Boosted forest of pruned trees.
//!
//! Each round normalizes the sample weights, grows and prunes a tree with
//! them, and measures the tree's weighted error `err`. The tree votes with
//! `ln(sqrt((1 - err) / err))`; misclassified samples are multiplied by
//! `sqrt((1 - err) / err)` and the rest divided by it before the next round.

use crate::config::ForestConfig;
use crate::core::error::{ForestError, Result};
use crate::core::traits::{Classifier, FeatureRow};
use crate::core::types::{Class, RoundIndex, Weight};
use crate::dataset::{validate_pair, DataSet, SampleWeights};
use crate::ensure;
use crate::io::model_file;
use crate::tree::{SplitFinderConfig, Tree};
use ndarray::{Array1, ArrayView2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// A tree with its boosting vote weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestMember {
    pub tree: Tree,
    /// Vote weight; zero or negative weights are valid
    pub weight: f64,
}

/// Outcome of one boosting round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// 1-based round number
    pub round: RoundIndex,
    /// Sum of all sample weights after the round's normalization
    pub weight_total: Weight,
    /// Normalized weight of the samples the pruned tree misclassified
    pub error_weight: f64,
    pub tree_weight: f64,
    /// Effective terminals after pruning
    pub terminals: usize,
}

/// Weighted ensemble of trees built by boosting.
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    config: ForestConfig,
    members: Vec<ForestMember>,
    history: Vec<RoundSummary>,
}

impl Forest {
    /// Creates an empty forest.
    pub fn new(config: ForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Forest {
            config,
            members: Vec::new(),
            history: Vec::new(),
        })
    }

    /// Creates an empty forest that trains `num_rounds` trees with default
    /// settings otherwise.
    pub fn with_rounds(num_rounds: usize) -> Result<Self> {
        Self::new(ForestConfig {
            num_rounds,
            ..ForestConfig::default()
        })
    }

    /// Wraps existing members, e.g. ones read back from a model file.
    pub fn from_members(members: Vec<ForestMember>) -> Self {
        Forest {
            config: ForestConfig::default(),
            members,
            history: Vec::new(),
        }
    }

    /// Trains `num_rounds` rounds starting from each point's initial weight,
    /// replacing any previous members.
    ///
    /// A degenerate round (weighted error of 0 or 1) stops training with
    /// [`ForestError::DegenerateRound`]; trees of earlier rounds are kept.
    pub fn train(&mut self, signal: &DataSet, background: &DataSet) -> Result<()> {
        let mut weights = SampleWeights::from_datasets(signal, background);
        self.train_with_weights(signal, background, &mut weights)
    }

    /// Like [`train`](Self::train) but boosts the caller's weight vectors,
    /// which hold the reweighted values afterwards.
    pub fn train_with_weights(
        &mut self,
        signal: &DataSet,
        background: &DataSet,
        weights: &mut SampleWeights,
    ) -> Result<()> {
        validate_pair(signal, background)?;
        weights.check_matches(signal, background)?;
        ensure!(
            !(signal.is_empty() && background.is_empty()),
            ForestError::EmptyTrainingData
        );

        self.members.clear();
        self.history.clear();

        log::info!(
            "Training forest: {} rounds on {} signal / {} background points (alpha {})",
            self.config.num_rounds,
            signal.len(),
            background.len(),
            self.config.alpha
        );

        if self.config.parallel_split_search {
            let pool = self.config.build_thread_pool()?;
            pool.install(|| self.run_rounds(signal, background, weights))
        } else {
            self.run_rounds(signal, background, weights)
        }
    }

    fn run_rounds(
        &mut self,
        signal: &DataSet,
        background: &DataSet,
        weights: &mut SampleWeights,
    ) -> Result<()> {
        for round in 1..=self.config.num_rounds {
            self.train_round(round, signal, background, weights)?;
        }
        Ok(())
    }

    fn train_round(
        &mut self,
        round: RoundIndex,
        signal: &DataSet,
        background: &DataSet,
        weights: &mut SampleWeights,
    ) -> Result<()> {
        weights.normalize()?;
        let weight_total = weights.total();
        log::debug!("Round {}: normalized weight total {}", round, weight_total);

        let mut tree = Tree::train(
            signal,
            background,
            weights,
            SplitFinderConfig::from(&self.config),
        )?;
        let terminals = tree.prune(signal, background, self.config.alpha)?;

        let signal_wrong: Vec<bool> = signal
            .points()
            .iter()
            .map(|point| !Class::from_purity(tree.run_data_point(point)).is_signal())
            .collect();
        let background_wrong: Vec<bool> = background
            .points()
            .iter()
            .map(|point| Class::from_purity(tree.run_data_point(point)).is_signal())
            .collect();

        let error_weight: Weight = misclassified_weight(weights.signal(), &signal_wrong)
            + misclassified_weight(weights.background(), &background_wrong);
        let factor = ((1.0 - error_weight) / error_weight).sqrt();
        let tree_weight = factor.ln();

        if error_weight <= 0.0 || error_weight >= 1.0 || !tree_weight.is_finite() {
            log::warn!(
                "Round {}: degenerate weighted error {} (tree weight {}), stopping",
                round,
                error_weight,
                tree_weight
            );
            return Err(ForestError::degenerate_round(round, error_weight, tree_weight));
        }

        reweight(weights.of_mut(Class::Signal), &signal_wrong, factor);
        reweight(weights.of_mut(Class::Background), &background_wrong, factor);

        log::info!(
            "Round {}/{}: error weight {:.6}, tree weight {:.6}, {} terminals",
            round,
            self.config.num_rounds,
            error_weight,
            tree_weight,
            terminals
        );

        self.members.push(ForestMember {
            tree,
            weight: tree_weight,
        });
        self.history.push(RoundSummary {
            round,
            weight_total,
            error_weight,
            tree_weight,
            terminals,
        });
        Ok(())
    }

    /// Weighted mean of the member purities, `Σ w·p / Σ w`, unclamped.
    ///
    /// NaN for an empty forest or when the weights sum to zero.
    pub fn run_data_point<R: FeatureRow + ?Sized>(&self, row: &R) -> f64 {
        let (weighted, total) = self
            .members
            .iter()
            .fold((0.0, 0.0), |(weighted, total), member| {
                (
                    weighted + member.weight * member.tree.run_data_point(row),
                    total + member.weight,
                )
            });
        weighted / total
    }

    /// Predicts every row of a feature matrix in parallel.
    pub fn predict_batch(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        ensure!(
            !self.members.is_empty(),
            ForestError::prediction("forest has no trees")
        );
        let needed = self.num_features();
        ensure!(
            features.ncols() >= needed,
            ForestError::prediction(format!(
                "rows have {} features, forest needs {}",
                features.ncols(),
                needed
            ))
        );

        let outputs: Vec<f64> = features
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| self.run_data_point(&row))
            .collect();
        Ok(Array1::from(outputs))
    }

    /// Minimum feature vector length any member needs.
    pub fn num_features(&self) -> usize {
        self.members
            .iter()
            .map(|member| member.tree.num_features())
            .max()
            .unwrap_or(0)
    }

    pub fn members(&self) -> &[ForestMember] {
        &self.members
    }

    /// Per-round summaries of the last training run.
    pub fn history(&self) -> &[RoundSummary] {
        &self.history
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Writes the member count, then each weight and tree.
    pub fn export<W: Write>(&self, writer: &mut W) -> Result<()> {
        model_file::write_forest(self, writer)
    }

    /// Reads a forest written by [`Forest::export`]. The returned forest
    /// carries the default configuration and no round history.
    pub fn import<R: Read>(reader: &mut R) -> Result<Forest> {
        model_file::read_forest(reader)
    }

    /// Sum of the member vote weights.
    pub fn total_weight(&self) -> f64 {
        self.members.iter().map(|member| member.weight).sum()
    }
}

fn misclassified_weight(weights: &[Weight], wrong: &[bool]) -> Weight {
    weights
        .iter()
        .zip(wrong)
        .filter(|&(_, &wrong)| wrong)
        .map(|(weight, _)| weight)
        .sum()
}

fn reweight(weights: &mut [Weight], wrong: &[bool], factor: f64) {
    for (weight, &wrong) in weights.iter_mut().zip(wrong) {
        if wrong {
            *weight *= factor;
        } else {
            *weight /= factor;
        }
    }
}

impl Classifier for Forest {
    fn run_data_point<R: FeatureRow + ?Sized>(&self, row: &R) -> f64 {
        Forest::run_data_point(self, row)
    }

    fn num_features(&self) -> usize {
        Forest::num_features(self)
    }

    fn name(&self) -> &'static str {
        "forest"
    }
}
