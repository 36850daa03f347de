//! Evaluation of a trained model against labelled corpora.

use crate::core::error::Result;
use crate::core::traits::Classifier;
use crate::core::types::Class;
use crate::dataset::DataSet;
use serde::{Deserialize, Serialize};

/// Confusion counts with signal as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub true_signal: usize,
    pub false_signal: usize,
    pub true_background: usize,
    pub false_background: usize,
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.true_signal + self.false_signal + self.true_background + self.false_background
    }

    pub fn correct(&self) -> usize {
        self.true_signal + self.true_background
    }

    /// Fraction classified correctly; `NaN` when nothing was evaluated.
    pub fn accuracy(&self) -> f64 {
        self.correct() as f64 / self.total() as f64
    }

    pub fn misclassification_rate(&self) -> f64 {
        1.0 - self.accuracy()
    }

    /// Correct signal calls over all signal calls, 0 when there are none.
    pub fn precision(&self) -> f64 {
        let called = self.true_signal + self.false_signal;
        if called == 0 {
            0.0
        } else {
            self.true_signal as f64 / called as f64
        }
    }

    /// Signal points recovered, 0 when the signal corpus is empty.
    pub fn recall(&self) -> f64 {
        let actual = self.true_signal + self.false_background;
        if actual == 0 {
            0.0
        } else {
            self.true_signal as f64 / actual as f64
        }
    }
}

/// Classifies every point of both corpora, rounding outputs half-to-even.
pub fn evaluate<C: Classifier>(
    model: &C,
    signal: &DataSet,
    background: &DataSet,
) -> Result<ConfusionCounts> {
    signal.ensure_width("signal", model.num_features())?;
    background.ensure_width("background", model.num_features())?;
    let mut counts = ConfusionCounts::default();
    for point in signal.points() {
        match Class::from_purity(model.run_data_point(point)) {
            Class::Signal => counts.true_signal += 1,
            Class::Background => counts.false_background += 1,
        }
    }
    for point in background.points() {
        match Class::from_purity(model.run_data_point(point)) {
            Class::Signal => counts.false_signal += 1,
            Class::Background => counts.true_background += 1,
        }
    }
    Ok(counts)
}

pub fn accuracy<C: Classifier>(model: &C, signal: &DataSet, background: &DataSet) -> Result<f64> {
    Ok(evaluate(model, signal, background)?.accuracy())
}

pub fn misclassification_rate<C: Classifier>(
    model: &C,
    signal: &DataSet,
    background: &DataSet,
) -> Result<f64> {
    Ok(evaluate(model, signal, background)?.misclassification_rate())
}
