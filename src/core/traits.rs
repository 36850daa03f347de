//! Trait abstractions at the seams between data, models, and reports.

use ndarray::ArrayView1;

/// Read access to one feature vector.
///
/// Implemented for plain slices, [`DataPoint`](crate::dataset::DataPoint),
/// and ndarray row views so trees can route any of them.
pub trait FeatureRow {
    /// Value of the feature at `index`.
    fn feature(&self, index: usize) -> f64;

    /// Number of features in the row.
    fn num_features(&self) -> usize;
}

impl FeatureRow for [f64] {
    fn feature(&self, index: usize) -> f64 {
        self[index]
    }

    fn num_features(&self) -> usize {
        self.len()
    }
}

impl FeatureRow for Vec<f64> {
    fn feature(&self, index: usize) -> f64 {
        self[index]
    }

    fn num_features(&self) -> usize {
        self.len()
    }
}

impl FeatureRow for ArrayView1<'_, f64> {
    fn feature(&self, index: usize) -> f64 {
        self[index]
    }

    fn num_features(&self) -> usize {
        self.len()
    }
}

/// A trained model that maps a feature vector to a purity-like output.
///
/// Outputs near 1 favour signal and outputs near 0 favour background.
pub trait Classifier {
    /// Output for a single feature vector.
    ///
    /// Rows must hold at least [`num_features`](Self::num_features) values.
    fn run_data_point<R: FeatureRow + ?Sized>(&self, row: &R) -> f64;

    /// Minimum row length the model reads.
    fn num_features(&self) -> usize;

    /// Name used in logs and reports.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_feature_row_for_slice_and_view() {
        let values = vec![1.0, 2.5, -3.0];
        assert_eq!(values.as_slice().feature(1), 2.5);
        assert_eq!(values.num_features(), 3);

        let matrix = array![[1.0, 2.0], [3.0, 4.0]];
        let row = matrix.row(1);
        assert_eq!(row.feature(0), 3.0);
        assert_eq!(row.num_features(), 2);
    }
}
