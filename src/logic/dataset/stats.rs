//! Dataset statistics for exploration and reporting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::logic::features::{FEATURE_COUNT, FEATURE_LAYOUT};
use crate::logic::traffic::TrafficRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    pub name: String,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStats {
    pub total_records: usize,
    pub features: Vec<String>,
    pub label_distribution: BTreeMap<String, usize>,
    pub device_distribution: BTreeMap<String, usize>,
    /// Empty when there are no records
    pub feature_summaries: Vec<FeatureSummary>,
}

impl DatasetStats {
    pub fn from_records(records: &[TrafficRecord]) -> Self {
        let mut label_distribution = BTreeMap::new();
        let mut device_distribution = BTreeMap::new();

        let mut min = [f64::INFINITY; FEATURE_COUNT];
        let mut max = [f64::NEG_INFINITY; FEATURE_COUNT];
        let mut sum = [0.0f64; FEATURE_COUNT];

        for record in records {
            *label_distribution.entry(record.label.to_string()).or_insert(0) += 1;
            *device_distribution.entry(record.device.to_string()).or_insert(0) += 1;

            for (i, value) in record.feature_values().iter().enumerate() {
                let value = *value as f64;
                min[i] = min[i].min(value);
                max[i] = max[i].max(value);
                sum[i] += value;
            }
        }

        let feature_summaries = if records.is_empty() {
            Vec::new()
        } else {
            FEATURE_LAYOUT
                .iter()
                .enumerate()
                .map(|(i, name)| FeatureSummary {
                    name: name.to_string(),
                    min: min[i],
                    mean: sum[i] / records.len() as f64,
                    max: max[i],
                })
                .collect()
        };

        Self {
            total_records: records.len(),
            features: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            label_distribution,
            device_distribution,
            feature_summaries,
        }
    }

    /// Share of records carrying `label`, in [0, 1]
    pub fn label_share(&self, label: &str) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        self.label_distribution.get(label).copied().unwrap_or(0) as f64 / self.total_records as f64
    }
}
