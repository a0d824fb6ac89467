//! Model Module - Anomaly Detector
//!
//! Scaling, the burn feed-forward classifier, training, thresholded
//! inference and bundle persistence.

pub mod error;
pub mod scaler;
pub mod network;
pub mod metrics;
pub mod threshold;
pub mod detector;
pub mod bundle;
pub mod shared;

#[cfg(test)]
mod tests;

// Re-export common types
pub use error::{DetectorError, DetectorResult};
pub use scaler::StandardScaler;
pub use metrics::{BinaryMetrics, ClassificationReport, MetricsSummary, TrainingHistory};
pub use threshold::{count_flagged, ThresholdConfig};
pub use detector::{
    AnomalyDetector, DetectionBatch, DetectorState, PredictionResult, TestSet, TrainOptions,
    TrainingOutcome,
};
pub use bundle::ModelBundle;
pub use shared::SharedDetector;
