//! Monitor - Streaming simulation over a trained detector
//!
//! Each tick draws one simulated event, scores it and updates the
//! monitoring state. State is passed in and handed back explicitly;
//! nothing here is global.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::logic::features::feature_matrix;
use crate::logic::model::{AnomalyDetector, DetectorError, PredictionResult};
use crate::logic::traffic::{DeviceType, ProfileError, TrafficLabel, TrafficRecord, TrafficSimulator};

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Detector(#[from] DetectorError),
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Chance that a tick produces attack traffic
    pub attack_probability: f64,
    /// Detection threshold in [0, 1]
    pub threshold: f32,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            attack_probability: constants::DEFAULT_ATTACK_PROBABILITY,
            threshold: constants::DEFAULT_THRESHOLD,
        }
    }
}

/// A flagged event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub device: DeviceType,
    /// Ground-truth class of the simulated event
    pub label: TrafficLabel,
    /// Anomaly score in [0, 1]
    pub score: f32,
}

impl Alert {
    /// Flagged benign traffic
    pub fn is_false_alarm(&self) -> bool {
        !self.label.is_malicious()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub record: TrafficRecord,
    pub prediction: PredictionResult,
    pub alert: Option<Alert>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorState {
    pub processed: usize,
    /// Events flagged by the detector
    pub anomalies: usize,
    /// Most recent alerts, oldest first
    pub alerts: VecDeque<Alert>,
    /// Ground-truth label counts of processed events
    pub label_counts: BTreeMap<String, usize>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share of processed events that were flagged, in [0, 1]
    pub fn threat_level(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.anomalies as f64 / self.processed as f64
        }
    }

    /// Number of processed events carrying `label`
    pub fn count(&self, label: TrafficLabel) -> usize {
        self.label_counts.get(label.as_str()).copied().unwrap_or(0)
    }

    /// Up to `n` newest alerts, newest first
    pub fn recent_alerts(&self, n: usize) -> impl Iterator<Item = &Alert> {
        self.alerts.iter().rev().take(n)
    }

    fn push_alert(&mut self, alert: Alert) {
        if self.alerts.len() == constants::MAX_ALERTS {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert);
    }
}

// ============================================================================
// TICK
// ============================================================================

/// Generate one event, run detection on it and return the updated state.
/// On error `state` is left as it was.
pub fn tick(
    state: &MonitorState,
    simulator: &mut TrafficSimulator,
    detector: &AnomalyDetector,
    settings: &MonitorSettings,
) -> Result<(MonitorState, TickOutcome), MonitorError> {
    let record = simulator.random_event(settings.attack_probability)?;

    let x = feature_matrix(std::slice::from_ref(&record));
    let batch = detector.detect_with_threshold(&x, settings.threshold)?;
    // One row in, one prediction out
    let prediction = batch.predictions[0];

    let mut state = state.clone();
    state.processed += 1;
    *state.label_counts.entry(record.label.to_string()).or_insert(0) += 1;

    let alert = prediction.is_anomaly.then(|| Alert {
        timestamp: record.timestamp,
        device: record.device,
        label: record.label,
        score: prediction.score,
    });

    if let Some(alert) = &alert {
        state.anomalies += 1;
        state.push_alert(alert.clone());
        log::debug!(
            "Alert: {} on {} (score {:.3})",
            alert.label,
            alert.device,
            alert.score
        );
    }

    Ok((state, TickOutcome { record, prediction, alert }))
}
