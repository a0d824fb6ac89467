//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every default can be overridden through an `IOT_SHIELD_*` environment variable.

use std::path::PathBuf;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "IoT Shield";

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "iot-shield";

// ============================================
// Training defaults
// ============================================

/// Default number of training epochs
pub const DEFAULT_EPOCHS: usize = 30;

/// Default mini-batch size
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Fraction of rows held out for validation
pub const DEFAULT_VALIDATION_SPLIT: f32 = 0.2;

/// Seed for the train/validation split, weight init and shuffling
pub const DEFAULT_SEED: u64 = 42;

/// Adam learning rate
pub const DEFAULT_LEARNING_RATE: f32 = 0.001;

// ============================================
// Inference / monitoring defaults
// ============================================

/// Score cutoff above which a record is flagged anomalous
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Probability that a simulated monitoring event is an attack
pub const DEFAULT_ATTACK_PROBABILITY: f64 = 0.1;

/// Alerts kept in monitor state
pub const MAX_ALERTS: usize = 100;

// ============================================
// Artifact names
// ============================================

/// Model artifact (format, input width, feature layout, architecture)
pub const MODEL_FILE: &str = "anomaly_detector.json";

/// Network weights and batch-norm statistics
pub const WEIGHTS_FILE: &str = "anomaly_detector.bin";

/// Scaler artifact
pub const SCALER_FILE: &str = "preprocessor.json";

/// Metrics artifact
pub const METRICS_FILE: &str = "model_metrics.json";

/// Default dataset file name
pub const DATASET_FILE: &str = "synthetic_iot_dataset.csv";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Base directory for datasets and models
pub fn get_base_dir() -> PathBuf {
    std::env::var("IOT_SHIELD_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR_NAME)
        })
}

/// Get model bundle directory from environment or use default
pub fn get_model_dir() -> PathBuf {
    std::env::var("IOT_SHIELD_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_base_dir().join("models"))
}

/// Get dataset path from environment or use default
pub fn get_data_path() -> PathBuf {
    std::env::var("IOT_SHIELD_DATA_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_base_dir().join("data").join(DATASET_FILE))
}

/// Get epoch count from environment or use default
pub fn get_epochs() -> usize {
    env_parse("IOT_SHIELD_EPOCHS").unwrap_or(DEFAULT_EPOCHS)
}

/// Get batch size from environment or use default
pub fn get_batch_size() -> usize {
    env_parse("IOT_SHIELD_BATCH_SIZE").unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Get seed from environment or use default
pub fn get_seed() -> u64 {
    env_parse("IOT_SHIELD_SEED").unwrap_or(DEFAULT_SEED)
}

/// Get detection threshold from environment or use default
pub fn get_threshold() -> f32 {
    env_parse("IOT_SHIELD_THRESHOLD").unwrap_or(DEFAULT_THRESHOLD)
}

/// Get monitor attack probability from environment or use default
pub fn get_attack_probability() -> f64 {
    env_parse("IOT_SHIELD_ATTACK_PROBABILITY").unwrap_or(DEFAULT_ATTACK_PROBABILITY)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
