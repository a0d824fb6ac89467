//! Shared detector handle
//!
//! A detector has a single writer. Callers that need it from several
//! threads go through this handle, which serializes every call.

use std::sync::Arc;

use ndarray::{Array1, Array2};
use parking_lot::Mutex;

use super::bundle::ModelBundle;
use super::detector::{AnomalyDetector, DetectionBatch, TrainOptions, TrainingOutcome};
use super::error::DetectorResult;

#[derive(Debug, Clone)]
pub struct SharedDetector {
    inner: Arc<Mutex<AnomalyDetector>>,
}

impl SharedDetector {
    pub fn new(detector: AnomalyDetector) -> Self {
        Self {
            inner: Arc::new(Mutex::new(detector)),
        }
    }

    pub fn train(
        &self,
        x: &Array2<f32>,
        y: Option<&Array1<f32>>,
        options: &TrainOptions,
    ) -> DetectorResult<TrainingOutcome> {
        self.inner.lock().train(x, y, options)
    }

    pub fn detect(&self, x: &Array2<f32>) -> DetectorResult<DetectionBatch> {
        self.inner.lock().detect(x)
    }

    pub fn detect_with_threshold(&self, x: &Array2<f32>, threshold: f32) -> DetectorResult<DetectionBatch> {
        self.inner.lock().detect_with_threshold(x, threshold)
    }

    pub fn save(&self, bundle: &ModelBundle) -> DetectorResult<()> {
        self.inner.lock().save(bundle)
    }

    pub fn load(&self, bundle: &ModelBundle) -> DetectorResult<()> {
        self.inner.lock().load(bundle)
    }

    pub fn is_fitted(&self) -> bool {
        self.inner.lock().is_fitted()
    }

    /// Run `f` with exclusive access to the detector
    pub fn with<R>(&self, f: impl FnOnce(&mut AnomalyDetector) -> R) -> R {
        f(&mut self.inner.lock())
    }
}
