//! Application configuration

use std::path::PathBuf;

use crate::constants;
use crate::logic::model::TrainOptions;

/// Runtime configuration assembled from environment variables.
/// CLI flags override individual fields.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Dataset CSV location
    pub data_path: PathBuf,

    /// Model bundle directory
    pub model_dir: PathBuf,

    /// Training epochs
    pub epochs: usize,

    /// Mini-batch size
    pub batch_size: usize,

    /// Seed for generation, splitting and weight init
    pub seed: u64,

    /// Detection threshold in [0, 1]
    pub threshold: f32,

    /// Probability of an attack per monitor tick
    pub attack_probability: f64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            data_path: constants::get_data_path(),
            model_dir: constants::get_model_dir(),
            epochs: constants::get_epochs(),
            batch_size: constants::get_batch_size(),
            seed: constants::get_seed(),
            threshold: constants::get_threshold(),
            attack_probability: constants::get_attack_probability(),
        }
    }

    /// Training options derived from this configuration
    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            epochs: self.epochs,
            batch_size: self.batch_size,
            seed: self.seed,
            ..Default::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
