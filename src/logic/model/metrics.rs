//! Training Metrics
//!
//! Binary classification metrics (positive class = malicious), per-epoch
//! history and a per-class report of the held-out partition.

use chrono::{DateTime, Utc};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Probability clipping for the log loss
pub const LOSS_EPSILON: f32 = 1e-7;

/// Cutoff used for accuracy/precision/recall during training
pub const METRIC_THRESHOLD: f32 = 0.5;

// ============================================================================
// CONFUSION COUNTS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confusion {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl Confusion {
    pub fn from_predictions(probabilities: &Array1<f32>, labels: &Array1<f32>, threshold: f32) -> Self {
        let mut c = Confusion::default();
        for (&p, &y) in probabilities.iter().zip(labels.iter()) {
            match (p > threshold, y >= 0.5) {
                (true, true) => c.true_positive += 1,
                (true, false) => c.false_positive += 1,
                (false, false) => c.true_negative += 1,
                (false, true) => c.false_negative += 1,
            }
        }
        c
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }

    pub fn accuracy(&self) -> f32 {
        ratio(self.true_positive + self.true_negative, self.total())
    }

    pub fn precision(&self) -> f32 {
        ratio(self.true_positive, self.true_positive + self.false_positive)
    }

    pub fn recall(&self) -> f32 {
        ratio(self.true_positive, self.true_positive + self.false_negative)
    }

    /// Precision/recall of the negative (benign) class
    pub fn negative_precision(&self) -> f32 {
        ratio(self.true_negative, self.true_negative + self.false_negative)
    }

    pub fn negative_recall(&self) -> f32 {
        ratio(self.true_negative, self.true_negative + self.false_positive)
    }
}

fn ratio(num: usize, den: usize) -> f32 {
    if den == 0 { 0.0 } else { num as f32 / den as f32 }
}

/// Mean binary cross-entropy
pub fn binary_cross_entropy(probabilities: &Array1<f32>, labels: &Array1<f32>) -> f32 {
    if probabilities.is_empty() {
        return 0.0;
    }
    let sum: f32 = probabilities
        .iter()
        .zip(labels.iter())
        .map(|(&p, &y)| {
            let p = p.clamp(LOSS_EPSILON, 1.0 - LOSS_EPSILON);
            -(y * p.ln() + (1.0 - y) * (1.0 - p).ln())
        })
        .sum();
    sum / probabilities.len() as f32
}

// ============================================================================
// BINARY METRICS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BinaryMetrics {
    pub loss: f32,
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
}

impl BinaryMetrics {
    pub fn compute(probabilities: &Array1<f32>, labels: &Array1<f32>) -> Self {
        let confusion = Confusion::from_predictions(probabilities, labels, METRIC_THRESHOLD);
        Self {
            loss: binary_cross_entropy(probabilities, labels),
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
        }
    }
}

// ============================================================================
// HISTORY
// ============================================================================

/// Per-epoch metrics, one entry per epoch in every sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f32>,
    pub accuracy: Vec<f32>,
    pub precision: Vec<f32>,
    pub recall: Vec<f32>,
    pub val_loss: Vec<f32>,
    pub val_accuracy: Vec<f32>,
    pub val_precision: Vec<f32>,
    pub val_recall: Vec<f32>,
}

impl TrainingHistory {
    pub fn record(&mut self, train: &BinaryMetrics, validation: &BinaryMetrics) {
        self.loss.push(train.loss);
        self.accuracy.push(train.accuracy);
        self.precision.push(train.precision);
        self.recall.push(train.recall);
        self.val_loss.push(validation.loss);
        self.val_accuracy.push(validation.accuracy);
        self.val_precision.push(validation.precision);
        self.val_recall.push(validation.recall);
    }

    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn final_train(&self) -> Option<BinaryMetrics> {
        Some(BinaryMetrics {
            loss: *self.loss.last()?,
            accuracy: *self.accuracy.last()?,
            precision: *self.precision.last()?,
            recall: *self.recall.last()?,
        })
    }

    pub fn final_validation(&self) -> Option<BinaryMetrics> {
        Some(BinaryMetrics {
            loss: *self.val_loss.last()?,
            accuracy: *self.val_accuracy.last()?,
            precision: *self.val_precision.last()?,
            recall: *self.val_recall.last()?,
        })
    }
}

// ============================================================================
// METRICS SUMMARY (persisted)
// ============================================================================

/// Metrics artifact of a bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub final_loss: f32,
    pub final_val_loss: f32,
    pub final_accuracy: f32,
    pub final_val_accuracy: f32,
    pub final_precision: f32,
    pub final_val_precision: f32,
    pub final_recall: f32,
    pub final_val_recall: f32,
    pub epochs: usize,
    pub trained_at: DateTime<Utc>,
    /// SHA-256 of the model artifact written in the same bundle
    #[serde(default)]
    pub model_sha256: String,
    /// SHA-256 of the weights artifact written in the same bundle
    #[serde(default)]
    pub weights_sha256: String,
    /// SHA-256 of the scaler artifact written in the same bundle
    #[serde(default)]
    pub scaler_sha256: String,
}

impl MetricsSummary {
    /// Summary of a finished run; None for an empty history
    pub fn from_history(history: &TrainingHistory, trained_at: DateTime<Utc>) -> Option<Self> {
        let train = history.final_train()?;
        let val = history.final_validation()?;
        Some(Self {
            final_loss: train.loss,
            final_val_loss: val.loss,
            final_accuracy: train.accuracy,
            final_val_accuracy: val.accuracy,
            final_precision: train.precision,
            final_val_precision: val.precision,
            final_recall: train.recall,
            final_val_recall: val.recall,
            epochs: history.epochs(),
            trained_at,
            model_sha256: String::new(),
            weights_sha256: String::new(),
            scaler_sha256: String::new(),
        })
    }
}

// ============================================================================
// CLASSIFICATION REPORT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub precision: f32,
    pub recall: f32,
    pub f1: f32,
    pub support: usize,
}

impl ClassReport {
    fn new(precision: f32, recall: f32, support: usize) -> Self {
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self { precision, recall, f1, support }
    }
}

/// Benign/Malicious report on the held-out partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub benign: ClassReport,
    pub malicious: ClassReport,
    pub accuracy: f32,
    pub confusion: Confusion,
}

impl ClassificationReport {
    pub fn compute(probabilities: &Array1<f32>, labels: &Array1<f32>) -> Self {
        let c = Confusion::from_predictions(probabilities, labels, METRIC_THRESHOLD);
        Self {
            benign: ClassReport::new(
                c.negative_precision(),
                c.negative_recall(),
                c.true_negative + c.false_positive,
            ),
            malicious: ClassReport::new(c.precision(), c.recall(), c.true_positive + c.false_negative),
            accuracy: c.accuracy(),
            confusion: c,
        }
    }
}

impl std::fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:>12} {:>10} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score", "support")?;
        for (name, class) in [("Benign", &self.benign), ("Malicious", &self.malicious)] {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, class.precision, class.recall, class.f1, class.support
            )?;
        }
        write!(f, "{:>12} {:>32.2} {:>10}", "accuracy", self.accuracy, self.confusion.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_confusion_counts() {
        let p = array![0.9f32, 0.8, 0.2, 0.1, 0.6];
        let y = array![1.0f32, 0.0, 0.0, 1.0, 1.0];
        let c = Confusion::from_predictions(&p, &y, 0.5);

        assert_eq!(c.true_positive, 2);
        assert_eq!(c.false_positive, 1);
        assert_eq!(c.true_negative, 1);
        assert_eq!(c.false_negative, 1);
        assert!((c.accuracy() - 0.6).abs() < 1e-6);
        assert!((c.precision() - 2.0 / 3.0).abs() < 1e-6);
        assert!((c.recall() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_precision_without_positive_predictions_is_zero() {
        let c = Confusion::from_predictions(&array![0.1f32, 0.2], &array![1.0f32, 0.0], 0.5);
        assert_eq!(c.precision(), 0.0);
        assert_eq!(c.recall(), 0.0);
    }

    #[test]
    fn test_binary_cross_entropy() {
        let perfect = binary_cross_entropy(&array![1.0f32, 0.0], &array![1.0f32, 0.0]);
        assert!(perfect < 1e-5);

        let coin = binary_cross_entropy(&array![0.5f32, 0.5], &array![1.0f32, 0.0]);
        assert!((coin - std::f32::consts::LN_2).abs() < 1e-5);

        // Clipping keeps confident mistakes finite
        assert!(binary_cross_entropy(&array![0.0f32], &array![1.0f32]).is_finite());
    }

    #[test]
    fn test_history_and_summary() {
        let mut history = TrainingHistory::default();
        assert!(MetricsSummary::from_history(&history, Utc::now()).is_none());

        let train = BinaryMetrics { loss: 0.4, accuracy: 0.8, precision: 0.7, recall: 0.6 };
        let val = BinaryMetrics { loss: 0.5, accuracy: 0.75, precision: 0.65, recall: 0.55 };
        history.record(&train, &val);
        history.record(&BinaryMetrics { loss: 0.3, ..train }, &BinaryMetrics { loss: 0.35, ..val });

        assert_eq!(history.epochs(), 2);
        let summary = MetricsSummary::from_history(&history, Utc::now()).unwrap();
        assert_eq!(summary.final_loss, 0.3);
        assert_eq!(summary.final_val_loss, 0.35);
        assert_eq!(summary.epochs, 2);
    }

    #[test]
    fn test_classification_report() {
        let p = array![0.9f32, 0.1, 0.2, 0.7];
        let y = array![1.0f32, 0.0, 0.0, 0.0];
        let report = ClassificationReport::compute(&p, &y);

        assert_eq!(report.malicious.support, 1);
        assert_eq!(report.benign.support, 3);
        assert_eq!(report.malicious.recall, 1.0);
        assert!((report.malicious.precision - 0.5).abs() < 1e-6);
        assert!(report.to_string().contains("Malicious"));
    }
}
