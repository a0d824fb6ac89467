//! Features Module - Feature Schema & Matrix Preparation
//!
//! The layout is the contract between the generator's records and the
//! detector's input columns.

pub mod layout;
pub mod matrix;

// Re-export common types
pub use layout::{LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use matrix::{binary_labels, feature_matrix, prepare_features};
