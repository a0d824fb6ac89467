//! Feature Matrix - records to model input
//!
//! Builds the `(rows, FEATURE_COUNT)` matrix and the binary target
//! (`label != Benign`) consumed by the detector.

use ndarray::{Array1, Array2};

use super::layout::FEATURE_COUNT;
use crate::logic::traffic::TrafficRecord;

/// Feature matrix in layout column order
pub fn feature_matrix(records: &[TrafficRecord]) -> Array2<f32> {
    let mut matrix = Array2::<f32>::zeros((records.len(), FEATURE_COUNT));
    for (mut row, record) in matrix.rows_mut().into_iter().zip(records) {
        for (cell, value) in row.iter_mut().zip(record.feature_values()) {
            *cell = value;
        }
    }
    matrix
}

/// Binary target: 1.0 for any attack class, 0.0 for benign
pub fn binary_labels(records: &[TrafficRecord]) -> Array1<f32> {
    records
        .iter()
        .map(|r| if r.label.is_malicious() { 1.0 } else { 0.0 })
        .collect()
}

/// Matrix and target together
pub fn prepare_features(records: &[TrafficRecord]) -> (Array2<f32>, Array1<f32>) {
    (feature_matrix(records), binary_labels(records))
}
