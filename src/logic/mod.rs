//! Logic Module - Traffic Simulation & Detection Engines
//!
//! - `traffic/` - Device profiles and the synthetic flow generator
//! - `features/` - Feature layout and matrix preparation
//! - `dataset/` - Record collections, CSV interchange, statistics
//! - `model/` - Scaler, network, training, inference, bundle persistence
//! - `monitor/` - Streaming simulation loop over a trained detector

pub mod config;

pub mod traffic;
pub mod features;
pub mod dataset;
pub mod model;
pub mod monitor;
