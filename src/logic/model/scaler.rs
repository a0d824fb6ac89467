//! Standard Scaler
//!
//! Per-feature mean/variance normalization fitted on training data.
//! Features with zero variance get a unit scale so they map to 0.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::error::{DetectorError, DetectorResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub n_features: usize,
    pub n_samples_seen: usize,
    pub mean: Array1<f32>,
    pub variance: Array1<f32>,
    pub scale: Array1<f32>,
}

impl StandardScaler {
    /// Fit mean and (population) variance per column
    pub fn fit(x: &Array2<f32>) -> DetectorResult<Self> {
        let rows = x.nrows();
        if rows == 0 {
            return Err(DetectorError::InsufficientData { required: 1, actual: 0 });
        }

        // Accumulate in f64 so large byte counts don't lose precision
        let x64 = x.mapv(|v| v as f64);
        let mean64 = x64.sum_axis(Axis(0)) / rows as f64;
        let centered = &x64 - &mean64;
        let variance64 = (&centered * &centered).sum_axis(Axis(0)) / rows as f64;

        let mean = mean64.mapv(|v| v as f32);
        let variance = variance64.mapv(|v| v as f32);
        let scale = variance64.mapv(|v| {
            let std = v.sqrt();
            if std > f64::EPSILON { std as f32 } else { 1.0 }
        });

        Ok(Self {
            n_features: x.ncols(),
            n_samples_seen: rows,
            mean,
            variance,
            scale,
        })
    }

    pub fn transform(&self, x: &Array2<f32>) -> DetectorResult<Array2<f32>> {
        if x.ncols() != self.n_features {
            return Err(DetectorError::ShapeMismatch {
                expected: self.n_features,
                actual: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }

    /// Parameter arrays agree with `n_features`
    pub fn is_consistent(&self) -> bool {
        self.mean.len() == self.n_features
            && self.variance.len() == self.n_features
            && self.scale.len() == self.n_features
    }
}
