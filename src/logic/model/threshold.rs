//! Detection Threshold Configuration
//!
//! Scores and thresholds share one normalized scale: [0, 1].
//! A row is anomalous when its score is strictly above the threshold.

use serde::{Deserialize, Serialize};

use super::error::{DetectorError, DetectorResult};
use crate::constants;

/// Threshold Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Score cutoff (0.0 - 1.0)
    pub threshold: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            threshold: constants::DEFAULT_THRESHOLD,
        }
    }
}

impl ThresholdConfig {
    pub fn new(threshold: f32) -> DetectorResult<Self> {
        validate(threshold)?;
        Ok(Self { threshold })
    }

    /// High sensitivity (lower threshold, more alerts)
    pub fn high_sensitivity() -> Self {
        Self { threshold: 0.3 }
    }

    /// Low sensitivity (higher threshold, fewer alerts)
    pub fn low_sensitivity() -> Self {
        Self { threshold: 0.8 }
    }

    pub fn is_anomaly(&self, score: f32) -> bool {
        score > self.threshold
    }
}

/// Reject thresholds outside [0, 1] (including NaN)
pub fn validate(threshold: f32) -> DetectorResult<f32> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(DetectorError::InvalidThreshold(threshold))
    }
}

/// Number of scores strictly above `threshold`
pub fn count_flagged(scores: &[f32], threshold: f32) -> usize {
    scores.iter().filter(|&&s| s > threshold).count()
}
