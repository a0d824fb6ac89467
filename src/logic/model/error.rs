use std::path::PathBuf;

use thiserror::Error;

/// Detector failures. Every variant is surfaced to the caller as-is;
/// nothing is retried or defaulted internally.
#[derive(Debug, Error)]
pub enum DetectorError {
    // Contract errors
    #[error("training requires labels")]
    MissingLabels,

    #[error("expected {expected} feature columns, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("got {labels} labels for {rows} rows")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("label at row {index} must be 0 or 1, got {value}")]
    InvalidLabel { index: usize, value: f32 },

    #[error("need at least {required} rows to train, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid training options: {0}")]
    InvalidOptions(String),

    #[error("threshold must be within [0, 1], got {0}")]
    InvalidThreshold(f32),

    // State errors
    #[error("detector is not fitted")]
    NotFitted,

    // Persistence errors
    #[error("bundle artifact missing: {}", .0.display())]
    MissingArtifact(PathBuf),

    #[error("bundle is incompatible: {0}")]
    IncompatibleBundle(String),

    #[error("bundle was trained on {bundle} features, detector expects {detector}")]
    DimensionMismatch { detector: usize, bundle: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("model weights error: {0}")]
    Weights(String),
}

pub type DetectorResult<T> = Result<T, DetectorError>;
