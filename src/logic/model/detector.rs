//! Anomaly Detector
//!
//! Owns the scaler and the network for one feature width. A detector is
//! `Built` until `train` succeeds (`Fitted`) or a bundle is loaded into it
//! (`Restored`); only the last two serve inference.

use burn::module::AutodiffModule;
use burn::nn::loss::{BinaryCrossEntropyLoss, BinaryCrossEntropyLossConfig};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use chrono::Utc;
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::error::{DetectorError, DetectorResult};
use super::metrics::{BinaryMetrics, ClassificationReport, MetricsSummary, TrainingHistory};
use super::network::{self, Classifier, InferenceBackend, TrainingBackend};
use super::scaler::StandardScaler;
use super::threshold;
use crate::constants;

const ADAM_EPSILON: f32 = 1e-7;

// ============================================================================
// OPTIONS & RESULTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainOptions {
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of rows held out for validation, in (0, 1)
    pub validation_split: f32,
    /// Drives the split, batch order, weight init and dropout masks
    pub seed: u64,
    pub learning_rate: f32,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: constants::DEFAULT_EPOCHS,
            batch_size: constants::DEFAULT_BATCH_SIZE,
            validation_split: constants::DEFAULT_VALIDATION_SPLIT,
            seed: constants::DEFAULT_SEED,
            learning_rate: constants::DEFAULT_LEARNING_RATE,
        }
    }
}

impl TrainOptions {
    pub fn validate(&self) -> DetectorResult<()> {
        if self.epochs == 0 {
            return Err(DetectorError::InvalidOptions("epochs must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(DetectorError::InvalidOptions("batch_size must be at least 1".into()));
        }
        if !(self.validation_split > 0.0 && self.validation_split < 1.0) {
            return Err(DetectorError::InvalidOptions(format!(
                "validation_split must be within (0, 1), got {}",
                self.validation_split
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(DetectorError::InvalidOptions(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Held-out partition, already scaled
#[derive(Debug, Clone, PartialEq)]
pub struct TestSet {
    pub features: Array2<f32>,
    pub labels: Array1<f32>,
}

impl TestSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub history: TrainingHistory,
    pub test_set: TestSet,
    pub report: ClassificationReport,
}

/// Per-row detection result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub score: f32,          // 0.0 - 1.0
    pub is_anomaly: bool,
    pub threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionBatch {
    pub predictions: Vec<PredictionResult>,
    pub threshold: f32,
}

impl DetectionBatch {
    pub fn flags(&self) -> Vec<bool> {
        self.predictions.iter().map(|p| p.is_anomaly).collect()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.predictions.iter().map(|p| p.score).collect()
    }

    pub fn anomaly_count(&self) -> usize {
        self.predictions.iter().filter(|p| p.is_anomaly).count()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

// ============================================================================
// STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorState {
    Built,
    Fitted,
    Restored,
}

/// Everything a fitted or restored detector needs to serve inference
#[derive(Debug, Clone)]
pub(super) struct Trained {
    pub(super) network: Classifier<InferenceBackend>,
    pub(super) scaler: StandardScaler,
    pub(super) metrics: MetricsSummary,
    pub(super) history: Option<TrainingHistory>,
}

impl Trained {
    fn scores(&self, x: &Array2<f32>) -> DetectorResult<Array1<f32>> {
        let scaled = self.scaler.transform(x)?;
        Ok(self.network.predict(&scaled))
    }
}

#[derive(Debug, Clone)]
pub(super) enum Stage {
    Built,
    Fitted(Trained),
    Restored(Trained),
}

// ============================================================================
// DETECTOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    pub(super) input_dim: usize,
    pub(super) stage: Stage,
}

impl AnomalyDetector {
    pub fn new(input_dim: usize) -> DetectorResult<Self> {
        if input_dim == 0 {
            return Err(DetectorError::InvalidOptions("input_dim must be at least 1".into()));
        }
        Ok(Self {
            input_dim,
            stage: Stage::Built,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn state(&self) -> DetectorState {
        match self.stage {
            Stage::Built => DetectorState::Built,
            Stage::Fitted(_) => DetectorState::Fitted,
            Stage::Restored(_) => DetectorState::Restored,
        }
    }

    pub fn is_fitted(&self) -> bool {
        !matches!(self.stage, Stage::Built)
    }

    /// History of the last `train` call (not available after a restore)
    pub fn history(&self) -> Option<&TrainingHistory> {
        self.trained().ok().and_then(|t| t.history.as_ref())
    }

    /// Summary of the last training run, or of the loaded bundle
    pub fn metrics(&self) -> Option<&MetricsSummary> {
        self.trained().ok().map(|t| &t.metrics)
    }

    pub fn architecture(&self) -> Option<Vec<String>> {
        self.trained().ok().map(|_| network::architecture())
    }

    pub(super) fn trained(&self) -> DetectorResult<&Trained> {
        match &self.stage {
            Stage::Built => Err(DetectorError::NotFitted),
            Stage::Fitted(t) | Stage::Restored(t) => Ok(t),
        }
    }

    // ------------------------------------------------------------------------
    // Training
    // ------------------------------------------------------------------------

    /// Fit the scaler and train a freshly initialized network.
    ///
    /// On error the detector keeps its previous state.
    pub fn train(
        &mut self,
        x: &Array2<f32>,
        y: Option<&Array1<f32>>,
        options: &TrainOptions,
    ) -> DetectorResult<TrainingOutcome> {
        let y = y.ok_or(DetectorError::MissingLabels)?;
        options.validate()?;
        self.check_width(x)?;
        check_labels(x, y)?;

        let rows = x.nrows();
        if rows < 2 {
            return Err(DetectorError::InsufficientData { required: 2, actual: rows });
        }

        let scaler = StandardScaler::fit(x)?;
        let scaled = scaler.transform(x)?;

        let mut rng = StdRng::seed_from_u64(options.seed);
        let (train_idx, val_idx) = split_indices(rows, options.validation_split, &mut rng);

        let x_train = scaled.select(Axis(0), &train_idx);
        let y_train = y.select(Axis(0), &train_idx);
        let x_val = scaled.select(Axis(0), &val_idx);
        let y_val = y.select(Axis(0), &val_idx);

        log::info!(
            "Training detector: {} train / {} validation rows, {} epochs, batch {}",
            train_idx.len(),
            val_idx.len(),
            options.epochs,
            options.batch_size
        );

        let device = network::device();
        let _backend_rng = network::seed_backend(options.seed);

        let mut model = Classifier::<TrainingBackend>::new(self.input_dim, &device);
        let mut optimizer = AdamConfig::new().with_epsilon(ADAM_EPSILON).init();
        let loss_fn: BinaryCrossEntropyLoss<TrainingBackend> =
            BinaryCrossEntropyLossConfig::new().with_logits(true).init(&device);
        let learning_rate = f64::from(options.learning_rate);

        let mut history = TrainingHistory::default();
        let mut order: Vec<usize> = (0..train_idx.len()).collect();

        for epoch in 1..=options.epochs {
            order.shuffle(&mut rng);

            for batch in order.chunks(options.batch_size) {
                let xb = network::to_tensor(&x_train.select(Axis(0), batch), &device);
                let yb = network::to_targets(&y_train.select(Axis(0), batch), &device);

                let loss = loss_fn.forward(model.forward(xb), yb);
                let grads = GradientsParams::from_grads(loss.backward(), &model);
                model = optimizer.step(learning_rate, model, grads);
            }

            // Metrics in inference mode: running statistics, no dropout
            let snapshot = model.valid();
            let train_metrics = BinaryMetrics::compute(&snapshot.predict(&x_train), &y_train);
            let val_metrics = BinaryMetrics::compute(&snapshot.predict(&x_val), &y_val);
            history.record(&train_metrics, &val_metrics);

            log::debug!(
                "epoch {}/{}: loss={:.4} acc={:.4} val_loss={:.4} val_acc={:.4}",
                epoch,
                options.epochs,
                train_metrics.loss,
                train_metrics.accuracy,
                val_metrics.loss,
                val_metrics.accuracy
            );
        }

        let network = model.valid();
        let metrics = MetricsSummary::from_history(&history, Utc::now())
            .ok_or_else(|| DetectorError::InvalidOptions("training produced no epochs".into()))?;
        let report = ClassificationReport::compute(&network.predict(&x_val), &y_val);

        log::info!(
            "Training complete: loss={:.4} val_loss={:.4} val_acc={:.4}",
            metrics.final_loss,
            metrics.final_val_loss,
            metrics.final_val_accuracy
        );

        self.stage = Stage::Fitted(Trained {
            network,
            scaler,
            metrics,
            history: Some(history.clone()),
        });

        Ok(TrainingOutcome {
            history,
            test_set: TestSet {
                features: x_val,
                labels: y_val,
            },
            report,
        })
    }

    // ------------------------------------------------------------------------
    // Inference
    // ------------------------------------------------------------------------

    /// Detect with the default threshold (0.5)
    pub fn detect(&self, x: &Array2<f32>) -> DetectorResult<DetectionBatch> {
        self.detect_with_threshold(x, constants::DEFAULT_THRESHOLD)
    }

    /// Flag rows whose score is strictly above `threshold` (in [0, 1])
    pub fn detect_with_threshold(&self, x: &Array2<f32>, threshold: f32) -> DetectorResult<DetectionBatch> {
        let trained = self.trained()?;
        let threshold = threshold::validate(threshold)?;
        self.check_width(x)?;

        let predictions = trained
            .scores(x)?
            .iter()
            .map(|&score| PredictionResult {
                score,
                is_anomaly: score > threshold,
                threshold,
            })
            .collect();

        Ok(DetectionBatch { predictions, threshold })
    }

    /// Raw scores in [0, 1], one per row
    pub fn scores(&self, x: &Array2<f32>) -> DetectorResult<Array1<f32>> {
        let trained = self.trained()?;
        self.check_width(x)?;
        trained.scores(x)
    }

    /// Loss/accuracy/precision/recall on raw (unscaled) features
    pub fn evaluate(&self, x: &Array2<f32>, y: &Array1<f32>) -> DetectorResult<BinaryMetrics> {
        let trained = self.trained()?;
        self.check_width(x)?;
        check_labels(x, y)?;
        Ok(BinaryMetrics::compute(&trained.scores(x)?, y))
    }

    fn check_width(&self, x: &Array2<f32>) -> DetectorResult<()> {
        if x.ncols() != self.input_dim {
            return Err(DetectorError::ShapeMismatch {
                expected: self.input_dim,
                actual: x.ncols(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn check_labels(x: &Array2<f32>, y: &Array1<f32>) -> DetectorResult<()> {
    if y.len() != x.nrows() {
        return Err(DetectorError::LabelCountMismatch {
            rows: x.nrows(),
            labels: y.len(),
        });
    }
    if let Some((index, &value)) = y.iter().enumerate().find(|(_, &v)| v != 0.0 && v != 1.0) {
        return Err(DetectorError::InvalidLabel { index, value });
    }
    Ok(())
}

/// Shuffled (train, held-out) row indices; held-out size is
/// ceil(rows * split), clamped so neither side is empty. `rows` >= 2.
pub(super) fn split_indices(rows: usize, split: f32, rng: &mut StdRng) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..rows).collect();
    indices.shuffle(rng);

    let held_out = ((rows as f32 * split).ceil() as usize).clamp(1, rows - 1);
    let validation = indices.split_off(rows - held_out);
    (indices, validation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let mut rng = StdRng::seed_from_u64(42);
        let (train, val) = split_indices(1000, 0.2, &mut rng);
        assert_eq!(train.len(), 800);
        assert_eq!(val.len(), 200);

        let (train, val) = split_indices(2, 0.2, &mut rng);
        assert_eq!((train.len(), val.len()), (1, 1));

        let (train, val) = split_indices(11, 0.2, &mut rng);
        assert_eq!((train.len(), val.len()), (8, 3));
    }

    #[test]
    fn test_split_is_partition() {
        let mut rng = StdRng::seed_from_u64(3);
        let (train, val) = split_indices(50, 0.3, &mut rng);

        let mut all: Vec<usize> = train.iter().chain(val.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_options_validation() {
        assert!(TrainOptions::default().validate().is_ok());

        let bad = [
            TrainOptions { epochs: 0, ..Default::default() },
            TrainOptions { batch_size: 0, ..Default::default() },
            TrainOptions { validation_split: 0.0, ..Default::default() },
            TrainOptions { validation_split: 1.0, ..Default::default() },
            TrainOptions { learning_rate: 0.0, ..Default::default() },
        ];
        for options in bad {
            assert!(matches!(options.validate(), Err(DetectorError::InvalidOptions(_))));
        }
    }

    #[test]
    fn test_zero_input_dim_rejected() {
        assert!(AnomalyDetector::new(0).is_err());
        let detector = AnomalyDetector::new(8).unwrap();
        assert_eq!(detector.state(), DetectorState::Built);
        assert!(!detector.is_fitted());
        assert!(detector.history().is_none());
    }
}
