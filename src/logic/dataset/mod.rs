//! Dataset Module - Labeled Traffic Collections
//!
//! Ordered record collections with a uniform schema, used for training and
//! for replaying traffic. CSV is the interchange format with external tools.

pub mod io;
pub mod stats;

#[cfg(test)]
mod tests;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logic::features;
use crate::logic::traffic::{DeviceType, TrafficLabel, TrafficRecord, TrafficSimulator};

pub use stats::{DatasetStats, FeatureSummary};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dataset csv error: {0}")]
    Csv(#[from] csv::Error),
}

// ============================================================================
// GENERATION PLAN
// ============================================================================

/// Records generated per device and class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPlan {
    pub normal: usize,
    pub ddos: usize,
    pub port_scan: usize,
    pub mirai: usize,
}

impl Default for DatasetPlan {
    fn default() -> Self {
        Self {
            normal: 1000,
            ddos: 200,
            port_scan: 150,
            mirai: 100,
        }
    }
}

impl DatasetPlan {
    pub fn count_for(&self, label: TrafficLabel) -> usize {
        match label {
            TrafficLabel::Benign => self.normal,
            TrafficLabel::DDoS => self.ddos,
            TrafficLabel::PortScan => self.port_scan,
            TrafficLabel::Mirai => self.mirai,
        }
    }

    /// Records produced across all devices
    pub fn total(&self) -> usize {
        (self.normal + self.ddos + self.port_scan + self.mirai) * DeviceType::ALL.len()
    }
}

// ============================================================================
// DATASET
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<TrafficRecord>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<TrafficRecord>) -> Self {
        Self { records }
    }

    /// Generate every device/class combination of `plan`, device by device
    pub fn generate(simulator: &mut TrafficSimulator, plan: &DatasetPlan) -> Self {
        let mut records = Vec::with_capacity(plan.total());

        for device in DeviceType::ALL {
            for label in TrafficLabel::ALL {
                let n = plan.count_for(label);
                records.extend(simulator.generate(device, label, n));
                log::debug!("Generated {} {} records for {}", n, label, device);
            }
        }

        log::info!("Generated dataset with {} records", records.len());
        Self { records }
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = TrafficRecord>) {
        self.records.extend(records);
    }

    pub fn push(&mut self, record: TrafficRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[TrafficRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TrafficRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last `n` records, oldest first
    pub fn tail(&self, n: usize) -> &[TrafficRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Random subset of `n` records without replacement.
    /// Asking for more than `len()` returns every record in shuffled order.
    pub fn sample(&self, n: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let records = self
            .records
            .choose_multiple(&mut rng, n.min(self.records.len()))
            .cloned()
            .collect();
        Self { records }
    }

    /// Feature matrix and binary target
    pub fn prepare_features(&self) -> (Array2<f32>, Array1<f32>) {
        features::prepare_features(&self.records)
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats::from_records(&self.records)
    }
}

impl FromIterator<TrafficRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = TrafficRecord>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}
