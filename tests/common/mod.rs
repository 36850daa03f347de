//! Shared corpora for the integration tests.

#![allow(dead_code)]

use decision_forest::{DataPoint, DataSet};
use rand::prelude::*;
use std::fs;
use std::path::Path;

pub fn names(num_features: usize) -> Vec<String> {
    (0..num_features).map(|i| format!("x{}", i)).collect()
}

pub fn corpus(rows: Vec<Vec<f64>>) -> DataSet {
    let width = rows.first().map_or(0, Vec::len);
    DataSet::from_points(names(width), rows.into_iter().map(DataPoint::new).collect())
        .expect("rows share one width")
}

/// Signal and background separated on feature 1: signal takes 0..=49 and
/// background 70.5..=100. Feature 0 is constant.
pub fn separable_pair() -> (DataSet, DataSet) {
    let signal = (0..50).map(|i| vec![5.0, i as f64]).collect();
    let background = (0..60).map(|k| vec![5.0, 100.0 - 0.5 * k as f64]).collect();
    (corpus(signal), corpus(background))
}

/// Two shifted uniform clouds overlapping on `[-0.5, 0.5]` in every feature.
pub fn overlapping_pair(
    num_signal: usize,
    num_background: usize,
    num_features: usize,
    seed: u64,
) -> (DataSet, DataSet) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut cloud = |count: usize, center: f64| -> DataSet {
        corpus(
            (0..count)
                .map(|_| {
                    (0..num_features)
                        .map(|_| center + rng.gen_range(-2.0..2.0))
                        .collect()
                })
                .collect(),
        )
    };
    let signal = cloud(num_signal, 1.5);
    let background = cloud(num_background, -1.5);
    (signal, background)
}

/// Random rows with `num_features` values in `[0, 10)`.
pub fn random_rows(count: usize, num_features: usize, seed: u64) -> DataSet {
    let mut rng = StdRng::seed_from_u64(seed);
    corpus(
        (0..count)
            .map(|_| (0..num_features).map(|_| rng.gen_range(0.0..10.0)).collect())
            .collect(),
    )
}

/// Writes a corpus as tab-separated text with a header row.
pub fn write_corpus(path: &Path, data: &DataSet) {
    let mut text = data.names().join("\t");
    text.push('\n');
    for point in data.points() {
        let row: Vec<String> = point.features.iter().map(|v| v.to_string()).collect();
        text.push_str(&row.join("\t"));
        text.push('\n');
    }
    fs::write(path, text).expect("write corpus");
}
