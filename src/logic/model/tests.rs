//! Detector lifecycle tests: train, detect, save, load.

use std::fs;
use std::io;
use std::path::Path;

use ndarray::{Array1, Array2};
use tempfile::TempDir;

use super::*;
use crate::logic::features::{prepare_features, FEATURE_COUNT};
use crate::logic::traffic::{DeviceType, TrafficLabel, TrafficRecord, TrafficSimulator};

/// `benign` normal records and `attacks` attack records, spread over
/// every device and attack class
fn mixture(seed: u64, benign: usize, attacks: usize) -> (Array2<f32>, Array1<f32>) {
    let mut sim = TrafficSimulator::with_seed(seed);
    let mut records: Vec<TrafficRecord> = Vec::new();

    for i in 0..benign {
        let device = DeviceType::ALL[i % DeviceType::ALL.len()];
        records.extend(sim.generate(device, TrafficLabel::Benign, 1));
    }
    for i in 0..attacks {
        let device = DeviceType::ALL[i % DeviceType::ALL.len()];
        let label = TrafficLabel::ATTACKS[i % TrafficLabel::ATTACKS.len()];
        records.extend(sim.generate(device, label, 1));
    }

    prepare_features(&records)
}

fn quick_options() -> TrainOptions {
    TrainOptions {
        epochs: 3,
        batch_size: 32,
        ..Default::default()
    }
}

fn fitted_detector() -> (AnomalyDetector, Array2<f32>) {
    let (x, y) = mixture(5, 200, 100);
    let mut detector = AnomalyDetector::new(FEATURE_COUNT).unwrap();
    detector.train(&x, Some(&y), &quick_options()).unwrap();
    (detector, x)
}

// ============================================================================
// TRAINING
// ============================================================================

#[test]
fn test_train_thousand_records_five_epochs() {
    let (x, y) = mixture(1, 800, 200);
    assert_eq!(x.dim(), (1000, FEATURE_COUNT));
    assert_eq!(y.sum(), 200.0);

    let mut detector = AnomalyDetector::new(FEATURE_COUNT).unwrap();
    let options = TrainOptions { epochs: 5, ..Default::default() };
    let outcome = detector.train(&x, Some(&y), &options).unwrap();

    assert_eq!(outcome.history.loss.len(), 5);
    assert_eq!(outcome.history.accuracy.len(), 5);
    assert_eq!(outcome.history.val_loss.len(), 5);
    assert_eq!(outcome.history.val_recall.len(), 5);
    assert_eq!(outcome.test_set.len(), 200);
    assert_eq!(outcome.test_set.features.ncols(), FEATURE_COUNT);
    assert_eq!(
        outcome.report.benign.support + outcome.report.malicious.support,
        200
    );

    assert_eq!(detector.state(), DetectorState::Fitted);
    assert_eq!(detector.history(), Some(&outcome.history));
    assert_eq!(detector.metrics().map(|m| m.epochs), Some(5));
}

#[test]
fn test_attack_traffic_is_separable() {
    let (x, y) = mixture(2, 300, 300);
    let mut detector = AnomalyDetector::new(FEATURE_COUNT).unwrap();
    let options = TrainOptions {
        epochs: 10,
        batch_size: 32,
        ..Default::default()
    };
    let outcome = detector.train(&x, Some(&y), &options).unwrap();

    let labels = &outcome.test_set.labels;
    let malicious = labels.sum() / labels.len() as f32;
    let baseline = malicious.max(1.0 - malicious);
    let val_accuracy = *outcome.history.val_accuracy.last().unwrap();

    assert!(
        val_accuracy > baseline,
        "validation accuracy {val_accuracy} not above baseline {baseline}"
    );
}

#[test]
fn test_same_seed_same_split_and_history() {
    let (x, y) = mixture(3, 120, 40);
    let options = quick_options();

    let mut a = AnomalyDetector::new(FEATURE_COUNT).unwrap();
    let mut b = AnomalyDetector::new(FEATURE_COUNT).unwrap();
    let first = a.train(&x, Some(&y), &options).unwrap();
    let second = b.train(&x, Some(&y), &options).unwrap();

    assert_eq!(first.test_set, second.test_set);
    assert_eq!(first.history, second.history);
    assert_eq!(a.scores(&x).unwrap(), b.scores(&x).unwrap());
}

#[test]
fn test_train_without_labels_fails() {
    let (x, _) = mixture(4, 20, 10);
    let mut detector = AnomalyDetector::new(FEATURE_COUNT).unwrap();

    let result = detector.train(&x, None, &quick_options());
    assert!(matches!(result, Err(DetectorError::MissingLabels)));
    assert_eq!(detector.state(), DetectorState::Built);
}

#[test]
fn test_train_rejects_malformed_input() {
    let mut detector = AnomalyDetector::new(FEATURE_COUNT).unwrap();
    let options = quick_options();

    let narrow = Array2::<f32>::zeros((10, 5));
    let labels = Array1::<f32>::zeros(10);
    assert!(matches!(
        detector.train(&narrow, Some(&labels), &options),
        Err(DetectorError::ShapeMismatch { expected: 8, actual: 5 })
    ));

    let x = Array2::<f32>::zeros((10, FEATURE_COUNT));
    let short = Array1::<f32>::zeros(9);
    assert!(matches!(
        detector.train(&x, Some(&short), &options),
        Err(DetectorError::LabelCountMismatch { rows: 10, labels: 9 })
    ));

    let mut bad = Array1::<f32>::zeros(10);
    bad[3] = 0.5;
    assert!(matches!(
        detector.train(&x, Some(&bad), &options),
        Err(DetectorError::InvalidLabel { index: 3, .. })
    ));

    let one = Array2::<f32>::zeros((1, FEATURE_COUNT));
    assert!(matches!(
        detector.train(&one, Some(&Array1::zeros(1)), &options),
        Err(DetectorError::InsufficientData { required: 2, actual: 1 })
    ));

    assert!(!detector.is_fitted());
}

// ============================================================================
// INFERENCE
// ============================================================================

#[test]
fn test_detect_before_fit_fails() {
    let detector = AnomalyDetector::new(FEATURE_COUNT).unwrap();
    let x = Array2::<f32>::zeros((2, FEATURE_COUNT));

    assert!(matches!(detector.detect(&x), Err(DetectorError::NotFitted)));
    assert!(matches!(
        detector.save(&ModelBundle::new("unused")),
        Err(DetectorError::NotFitted)
    ));
}

#[test]
fn test_detect_results() {
    let (detector, x) = fitted_detector();

    let batch = detector.detect(&x).unwrap();
    assert_eq!(batch.len(), x.nrows());
    assert_eq!(batch.threshold, 0.5);
    for p in &batch.predictions {
        assert!((0.0..=1.0).contains(&p.score));
        assert_eq!(p.is_anomaly, p.score > 0.5);
        assert_eq!(p.threshold, 0.5);
    }
    assert_eq!(batch.anomaly_count(), batch.flags().iter().filter(|f| **f).count());
}

#[test]
fn test_detect_rejects_wrong_width_and_threshold() {
    let (detector, _) = fitted_detector();

    let wide = Array2::<f32>::zeros((3, FEATURE_COUNT + 1));
    assert!(matches!(
        detector.detect(&wide),
        Err(DetectorError::ShapeMismatch { expected: 8, actual: 9 })
    ));

    let x = Array2::<f32>::zeros((3, FEATURE_COUNT));
    // Percent-style thresholds are rejected rather than rescaled
    assert!(matches!(
        detector.detect_with_threshold(&x, 50.0),
        Err(DetectorError::InvalidThreshold(_))
    ));
}

#[test]
fn test_threshold_monotonicity() {
    let (detector, x) = fitted_detector();

    let mut previous = usize::MAX;
    for step in 0..=10 {
        let t = step as f32 / 10.0;
        let flagged = detector.detect_with_threshold(&x, t).unwrap().anomaly_count();
        assert!(flagged <= previous);
        previous = flagged;
    }

    let scores = detector.detect(&x).unwrap().scores();
    assert!(
        count_flagged(&scores, ThresholdConfig::high_sensitivity().threshold)
            >= count_flagged(&scores, ThresholdConfig::low_sensitivity().threshold)
    );
}

#[test]
fn test_evaluate_matches_label_width() {
    let (detector, x) = fitted_detector();
    let (_, y) = mixture(5, 200, 100);

    let metrics = detector.evaluate(&x, &y).unwrap();
    assert!((0.0..=1.0).contains(&metrics.accuracy));
    assert!(metrics.loss.is_finite());

    assert!(matches!(
        detector.evaluate(&x, &Array1::zeros(3)),
        Err(DetectorError::LabelCountMismatch { .. })
    ));
}

// ============================================================================
// PERSISTENCE
// ============================================================================

#[test]
fn test_save_load_equivalence() {
    let (detector, x) = fitted_detector();
    let dir = TempDir::new().unwrap();
    let bundle = ModelBundle::new(dir.path().join("models"));

    detector.save(&bundle).unwrap();
    assert!(bundle.is_complete());

    let restored = AnomalyDetector::restore(FEATURE_COUNT, &bundle).unwrap();
    assert_eq!(restored.state(), DetectorState::Restored);
    assert!(restored.history().is_none());

    let saved = detector.detect(&x).unwrap();
    let reloaded = restored.detect(&x).unwrap();
    assert_eq!(saved.flags(), reloaded.flags());
    for (a, b) in saved.scores().iter().zip(reloaded.scores()) {
        assert!((a - b).abs() < 1e-6, "{a} vs {b}");
    }

    let metrics = bundle.read_metrics().unwrap();
    assert_eq!(Some(metrics.final_loss), detector.metrics().map(|m| m.final_loss));
    assert_eq!(metrics.model_sha256.len(), 64);
    assert_eq!(metrics.weights_sha256.len(), 64);
}

#[test]
fn test_save_replaces_existing_bundle() {
    let (detector, _) = fitted_detector();
    let dir = TempDir::new().unwrap();
    let bundle = ModelBundle::new(dir.path().join("models"));

    detector.save(&bundle).unwrap();
    fs::write(bundle.dir().join("stale.txt"), "old").unwrap();
    detector.save(&bundle).unwrap();

    assert!(bundle.is_complete());
    assert!(!bundle.dir().join("stale.txt").exists());

    // No staging or replaced directories left beside the bundle
    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_failed_publish_restores_previous_bundle() {
    let (detector, x) = fitted_detector();
    let dir = TempDir::new().unwrap();
    let bundle = ModelBundle::new(dir.path().join("models"));
    detector.save(&bundle).unwrap();
    let before = detector.scores(&x).unwrap();

    // Moving the staged directory into place fails; every other rename works
    let result = bundle.publish_with(&[(crate::constants::MODEL_FILE, b"{}".as_slice())], |from, to| {
        let staged = from
            .file_name()
            .map_or(false, |name| name.to_string_lossy().contains(".staging-"));
        if staged {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "rename refused"))
        } else {
            fs::rename(from, to)
        }
    });
    assert!(matches!(result, Err(DetectorError::Io(_))));

    let restored = AnomalyDetector::restore(FEATURE_COUNT, &bundle).unwrap();
    assert_eq!(restored.scores(&x).unwrap(), before);

    let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_publish_without_previous_bundle() {
    let dir = TempDir::new().unwrap();
    let bundle = ModelBundle::new(dir.path().join("nested").join("models"));

    bundle
        .publish_with(&[("a.txt", b"a".as_slice())], |from: &Path, to: &Path| fs::rename(from, to))
        .unwrap();
    assert_eq!(fs::read(bundle.dir().join("a.txt")).unwrap(), b"a");
}

#[test]
fn test_partial_bundle_rejected() {
    let (detector, _) = fitted_detector();
    let dir = TempDir::new().unwrap();
    let bundle = ModelBundle::new(dir.path().join("models"));
    detector.save(&bundle).unwrap();

    fs::remove_file(bundle.scaler_path()).unwrap();
    assert!(!bundle.is_complete());

    let result = AnomalyDetector::restore(FEATURE_COUNT, &bundle);
    assert!(matches!(result, Err(DetectorError::MissingArtifact(p)) if p == bundle.scaler_path()));
}

#[test]
fn test_mixed_bundle_rejected() {
    let (first, _) = fitted_detector();
    let (x, y) = mixture(9, 100, 50);
    let mut second = AnomalyDetector::new(FEATURE_COUNT).unwrap();
    second.train(&x, Some(&y), &quick_options()).unwrap();

    let dir = TempDir::new().unwrap();
    let a = ModelBundle::new(dir.path().join("a"));
    let b = ModelBundle::new(dir.path().join("b"));
    first.save(&a).unwrap();
    second.save(&b).unwrap();

    fs::copy(b.scaler_path(), a.scaler_path()).unwrap();
    assert!(matches!(
        AnomalyDetector::restore(FEATURE_COUNT, &a),
        Err(DetectorError::IncompatibleBundle(_))
    ));

    first.save(&a).unwrap();
    fs::copy(b.weights_path(), a.weights_path()).unwrap();
    assert!(matches!(
        AnomalyDetector::restore(FEATURE_COUNT, &a),
        Err(DetectorError::IncompatibleBundle(msg)) if msg.contains("weights")
    ));
}

#[test]
fn test_dimension_mismatch_rejected() {
    let (detector, _) = fitted_detector();
    let dir = TempDir::new().unwrap();
    let bundle = ModelBundle::new(dir.path().join("models"));
    detector.save(&bundle).unwrap();

    assert!(matches!(
        AnomalyDetector::restore(7, &bundle),
        Err(DetectorError::DimensionMismatch { detector: 7, bundle: 8 })
    ));
}

#[test]
fn test_failed_load_keeps_state() {
    let (mut detector, x) = fitted_detector();
    let before = detector.scores(&x).unwrap();
    let dir = TempDir::new().unwrap();

    let result = detector.load(&ModelBundle::new(dir.path().join("missing")));
    assert!(matches!(result, Err(DetectorError::MissingArtifact(_))));
    assert_eq!(detector.state(), DetectorState::Fitted);
    assert_eq!(detector.scores(&x).unwrap(), before);
}
