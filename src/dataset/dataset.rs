//! Samples and corpora.
//!
//! A [`DataSet`] is an ordered collection of [`DataPoint`]s plus the ordered
//! feature names. Training code never copies points; it works on index lists
//! into the corpus (see [`DataSet::partition`]).

use crate::core::error::{ForestError, Result};
use crate::core::traits::FeatureRow;
use crate::core::types::{FeatureIndex, Weight};
use crate::dataset_error;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// One observation: a fixed-order feature vector plus its initial weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Feature values in corpus column order
    pub features: Vec<f64>,
    /// Initial boosting weight (1.0 when loaded)
    pub weight: Weight,
}

impl DataPoint {
    /// Creates a point with weight 1.0.
    pub fn new(features: Vec<f64>) -> Self {
        DataPoint {
            features,
            weight: 1.0,
        }
    }

    /// Creates a point with an explicit initial weight.
    pub fn with_weight(features: Vec<f64>, weight: Weight) -> Self {
        DataPoint { features, weight }
    }

    /// Number of features.
    pub fn num_features(&self) -> usize {
        self.features.len()
    }
}

impl FeatureRow for DataPoint {
    fn feature(&self, index: usize) -> f64 {
        self.features[index]
    }

    fn num_features(&self) -> usize {
        self.features.len()
    }
}

/// An ordered corpus of samples sharing one feature layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    names: Vec<String>,
    points: Vec<DataPoint>,
}

impl DataSet {
    /// Creates an empty corpus with the given feature names.
    pub fn new(names: Vec<String>) -> Self {
        DataSet {
            names,
            points: Vec::new(),
        }
    }

    /// Creates a corpus from names and points, validating every vector length.
    pub fn from_points(names: Vec<String>, points: Vec<DataPoint>) -> Result<Self> {
        let data = DataSet { names, points };
        data.validate("input")?;
        Ok(data)
    }

    /// Creates a corpus from a feature matrix (one row per sample, weight 1.0).
    ///
    /// When `names` is empty, columns are named `feature_0`, `feature_1`, ...
    pub fn from_array(names: Vec<String>, features: ArrayView2<'_, f64>) -> Result<Self> {
        let num_features = features.ncols();
        let names = if names.is_empty() {
            (0..num_features).map(|i| format!("feature_{}", i)).collect()
        } else if names.len() != num_features {
            return Err(dataset_error!(
                "{} feature names given for a matrix with {} columns",
                names.len(),
                num_features
            ));
        } else {
            names
        };

        let points = features
            .axis_iter(Axis(0))
            .map(|row| DataPoint::new(row.to_vec()))
            .collect();

        Ok(DataSet { names, points })
    }

    /// Appends a point. The length check happens at train time.
    pub fn add_data_point(&mut self, point: DataPoint) {
        self.points.push(point);
    }

    /// Feature names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// All points in insertion order.
    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    /// Point at `index`.
    pub fn point(&self, index: usize) -> Option<&DataPoint> {
        self.points.get(index)
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the corpus holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of features, taken from the names or, without names, the
    /// first point.
    pub fn num_features(&self) -> usize {
        if !self.names.is_empty() {
            self.names.len()
        } else {
            self.points.first().map_or(0, DataPoint::num_features)
        }
    }

    /// Initial weights of all points, in order.
    pub fn weights(&self) -> Vec<Weight> {
        self.points.iter().map(|p| p.weight).collect()
    }

    /// Checks that every point has [`num_features`](Self::num_features)
    /// values. `corpus` names the corpus in the error message.
    pub fn validate(&self, corpus: &str) -> Result<()> {
        self.validate_against(corpus, self.num_features())
    }

    /// Checks that every point has exactly `expected` values.
    pub fn validate_against(&self, corpus: &str, expected: usize) -> Result<()> {
        if !self.names.is_empty() && self.names.len() != expected {
            return Err(dataset_error!(
                "{} corpus has {} feature names, expected {}",
                corpus,
                self.names.len(),
                expected
            ));
        }
        for (index, point) in self.points.iter().enumerate() {
            if point.num_features() != expected {
                return Err(ForestError::feature_count_mismatch(
                    corpus,
                    index,
                    expected,
                    point.num_features(),
                ));
            }
        }
        Ok(())
    }

    /// Checks that every point holds at least `needed` values, so a model
    /// reading that many features can run on the whole corpus.
    pub fn ensure_width(&self, corpus: &str, needed: usize) -> Result<()> {
        match self.points.iter().position(|p| p.num_features() < needed) {
            Some(index) => Err(ForestError::prediction(format!(
                "{} point {} has {} features, the model reads {}",
                corpus,
                index,
                self.points[index].num_features(),
                needed
            ))),
            None => Ok(()),
        }
    }

    /// Splits `indices` by the split predicate `features[feature] <= threshold`
    /// into `(low, high)`, keeping the input order on each side.
    pub fn partition(
        &self,
        indices: &[usize],
        feature: FeatureIndex,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        indices
            .iter()
            .partition(|&&i| self.points[i].features[feature] <= threshold)
    }

    /// Copies the feature vectors into a dense matrix.
    pub fn feature_matrix(&self) -> Array2<f64> {
        let num_features = self.num_features();
        let mut matrix = Array2::zeros((self.points.len(), num_features));
        for (mut row, point) in matrix.axis_iter_mut(Axis(0)).zip(&self.points) {
            for (cell, &value) in row.iter_mut().zip(&point.features) {
                *cell = value;
            }
        }
        matrix
    }
}

/// Validates a signal/background pair for joint training and returns the
/// shared feature count.
pub fn validate_pair(signal: &DataSet, background: &DataSet) -> Result<usize> {
    let expected = if !signal.names().is_empty() || !signal.is_empty() {
        signal.num_features()
    } else {
        background.num_features()
    };
    signal.validate_against("signal", expected)?;
    background.validate_against("background", expected)?;
    Ok(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("x{}", i)).collect()
    }

    #[test]
    fn test_data_point_defaults() {
        let point = DataPoint::new(vec![1.0, 2.0]);
        assert_eq!(point.weight, 1.0);
        assert_eq!(point.num_features(), 2);
        assert_eq!(point.feature(1), 2.0);
    }

    #[test]
    fn test_from_points_rejects_ragged_vectors() {
        let points = vec![DataPoint::new(vec![1.0, 2.0]), DataPoint::new(vec![3.0])];
        let err = DataSet::from_points(names(2), points).unwrap_err();
        match err {
            ForestError::FeatureCountMismatch {
                index,
                expected,
                actual,
                ..
            } => {
                assert_eq!(index, 1);
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_partition_routes_equal_values_low() {
        let data = DataSet::from_points(
            names(1),
            vec![
                DataPoint::new(vec![1.0]),
                DataPoint::new(vec![2.0]),
                DataPoint::new(vec![3.0]),
            ],
        )
        .unwrap();
        let (low, high) = data.partition(&[0, 1, 2], 0, 2.0);
        assert_eq!(low, vec![0, 1]);
        assert_eq!(high, vec![2]);
    }

    #[test]
    fn test_array_round_trip() {
        let matrix = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let data = DataSet::from_array(Vec::new(), matrix.view()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.names()[1], "feature_1");
        assert_eq!(data.feature_matrix(), matrix);
    }

    #[test]
    fn test_from_array_rejects_wrong_name_count() {
        let matrix = array![[1.0, 2.0]];
        assert!(DataSet::from_array(names(3), matrix.view()).is_err());
    }

    #[test]
    fn test_validate_pair() {
        let signal = DataSet::from_points(names(2), vec![DataPoint::new(vec![1.0, 2.0])]).unwrap();
        let mut background = DataSet::new(names(2));
        background.add_data_point(DataPoint::new(vec![1.0, 2.0, 3.0]));
        let err = validate_pair(&signal, &background).unwrap_err();
        assert!(err.to_string().contains("background"));
    }
}
