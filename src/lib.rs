//! IoT Shield Core
//!
//! Synthetic IoT traffic generation and the anomaly detector lifecycle
//! (scaling, training, thresholded inference, bundle persistence).

pub mod constants;
pub mod logic;

pub use logic::dataset::{Dataset, DatasetPlan};
pub use logic::model::{AnomalyDetector, DetectorError, ModelBundle, TrainOptions};
pub use logic::traffic::{DeviceType, TrafficLabel, TrafficRecord, TrafficSimulator};
