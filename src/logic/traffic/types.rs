//! Traffic Types
//!
//! Core types for synthesized flow records.
//! Data structures only - sampling lives in `simulator.rs`.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("unknown device type: {0}")]
    UnknownDevice(String),

    #[error("unknown traffic label: {0}")]
    UnknownLabel(String),

    #[error("attack probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
}

// ============================================================================
// DEVICE ARCHETYPES
// ============================================================================

/// The five simulated device archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceType {
    #[serde(rename = "Smart Camera")]
    SmartCamera,
    #[serde(rename = "Smart Thermostat")]
    SmartThermostat,
    #[serde(rename = "Smart Lock")]
    SmartLock,
    #[serde(rename = "Smart Speaker")]
    SmartSpeaker,
    #[serde(rename = "Smart Light")]
    SmartLight,
}

impl DeviceType {
    pub const ALL: [DeviceType; 5] = [
        DeviceType::SmartCamera,
        DeviceType::SmartThermostat,
        DeviceType::SmartLock,
        DeviceType::SmartSpeaker,
        DeviceType::SmartLight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::SmartCamera => "Smart Camera",
            DeviceType::SmartThermostat => "Smart Thermostat",
            DeviceType::SmartLock => "Smart Lock",
            DeviceType::SmartSpeaker => "Smart Speaker",
            DeviceType::SmartLight => "Smart Light",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceType::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ProfileError::UnknownDevice(s.to_string()))
    }
}

// ============================================================================
// TRAFFIC LABEL
// ============================================================================

/// Ground-truth class of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrafficLabel {
    Benign,
    #[serde(rename = "DDoS")]
    DDoS,
    PortScan,
    Mirai,
}

impl TrafficLabel {
    pub const ALL: [TrafficLabel; 4] = [
        TrafficLabel::Benign,
        TrafficLabel::DDoS,
        TrafficLabel::PortScan,
        TrafficLabel::Mirai,
    ];

    pub const ATTACKS: [TrafficLabel; 3] = [
        TrafficLabel::DDoS,
        TrafficLabel::PortScan,
        TrafficLabel::Mirai,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficLabel::Benign => "Benign",
            TrafficLabel::DDoS => "DDoS",
            TrafficLabel::PortScan => "PortScan",
            TrafficLabel::Mirai => "Mirai",
        }
    }

    /// Binary training target: everything but benign is malicious
    pub fn is_malicious(&self) -> bool {
        *self != TrafficLabel::Benign
    }
}

impl std::fmt::Display for TrafficLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for TrafficLabel {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrafficLabel::ALL
            .iter()
            .copied()
            .find(|l| l.as_str() == s)
            .ok_or_else(|| ProfileError::UnknownLabel(s.to_string()))
    }
}

// ============================================================================
// TRAFFIC RECORD
// ============================================================================

/// One synthesized flow observation.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficRecord {
    /// Capture instant, informational only
    pub timestamp: DateTime<Utc>,
    pub device: DeviceType,

    /// Flow duration in seconds
    pub dur: f64,
    pub spkts: u32,
    pub dpkts: u32,
    pub sbytes: u64,
    pub dbytes: u64,
    pub rate: f64,
    pub sttl: u32,
    pub dttl: u32,

    pub label: TrafficLabel,
}

impl TrafficRecord {
    /// Feature values in layout order (see `features::layout`)
    pub fn feature_values(&self) -> [f32; 8] {
        [
            self.dur as f32,
            self.spkts as f32,
            self.dpkts as f32,
            self.sbytes as f32,
            self.dbytes as f32,
            self.rate as f32,
            self.sttl as f32,
            self.dttl as f32,
        ]
    }
}
