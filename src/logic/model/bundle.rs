//! Model Bundle Persistence
//!
//! A bundle is one directory holding four artifacts that only make sense
//! together: the model description, the network weights (a burn record),
//! the fitted scaler and the metrics summary. The metrics artifact carries
//! SHA-256 digests of the other three, so a bundle assembled from
//! different runs is rejected on load.
//!
//! Saving writes into a staging directory beside the target and publishes
//! it with a directory rename. The bundle directory is owned by the bundle:
//! anything else placed in it is replaced on the next save.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder, RecorderError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::detector::{AnomalyDetector, Stage, Trained};
use super::error::{DetectorError, DetectorResult};
use super::metrics::MetricsSummary;
use super::network::{self, Classifier, ClassifierRecord, InferenceBackend};
use super::scaler::StandardScaler;
use crate::constants;
use crate::logic::features::{LayoutInfo, FEATURE_COUNT};

/// Version of the model artifact format
pub const BUNDLE_FORMAT_VERSION: u32 = 2;

type WeightsRecorder = BinBytesRecorder<FullPrecisionSettings>;

// ============================================================================
// ARTIFACTS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    input_dim: usize,
    /// Present when the model was trained on the flow feature layout
    layout: Option<LayoutInfo>,
    architecture: Vec<String>,
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn weights_error(e: RecorderError) -> DetectorError {
    DetectorError::Weights(format!("{e:?}"))
}

fn encode_weights(model: &Classifier<InferenceBackend>) -> DetectorResult<Vec<u8>> {
    WeightsRecorder::default()
        .record(model.clone().into_record(), ())
        .map_err(weights_error)
}

fn decode_weights(input_dim: usize, bytes: Vec<u8>) -> DetectorResult<Classifier<InferenceBackend>> {
    let device = network::device();
    let record: ClassifierRecord<InferenceBackend> =
        WeightsRecorder::default().load(bytes, &device).map_err(weights_error)?;
    Ok(Classifier::new(input_dim, &device).load_record(record))
}

// ============================================================================
// BUNDLE HANDLE
// ============================================================================

/// Opaque handle to a bundle directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelBundle {
    dir: PathBuf,
}

impl ModelBundle {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Bundle at the configured model directory
    pub fn default_location() -> Self {
        Self::new(constants::get_model_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(constants::MODEL_FILE)
    }

    pub fn weights_path(&self) -> PathBuf {
        self.dir.join(constants::WEIGHTS_FILE)
    }

    pub fn scaler_path(&self) -> PathBuf {
        self.dir.join(constants::SCALER_FILE)
    }

    pub fn metrics_path(&self) -> PathBuf {
        self.dir.join(constants::METRICS_FILE)
    }

    /// All four artifacts are present (contents are not checked)
    pub fn is_complete(&self) -> bool {
        [self.model_path(), self.weights_path(), self.scaler_path(), self.metrics_path()]
            .iter()
            .all(|p| p.is_file())
    }

    /// Read only the metrics summary
    pub fn read_metrics(&self) -> DetectorResult<MetricsSummary> {
        let bytes = read_artifact(&self.metrics_path())?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Write all artifacts into a fresh staging directory, then swap it in
    fn publish(&self, artifacts: &[(&str, &[u8])]) -> DetectorResult<()> {
        self.publish_with(artifacts, |from, to| fs::rename(from, to))
    }

    /// `publish` with the directory rename supplied by the caller. If the
    /// staged directory cannot be moved into place, the previous bundle is
    /// moved back.
    pub(super) fn publish_with<R>(&self, artifacts: &[(&str, &[u8])], rename: R) -> DetectorResult<()>
    where
        R: Fn(&Path, &Path) -> std::io::Result<()>,
    {
        let parent = self
            .dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = self.dir.file_name().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("bundle path has no directory name: {}", self.dir.display()),
            )
        })?;
        let name = name.to_string_lossy();

        fs::create_dir_all(parent)?;

        let token = Uuid::new_v4().simple().to_string();
        let staging = parent.join(format!("{}.staging-{}", name, token));
        fs::create_dir(&staging)?;

        if let Err(e) = write_all(&staging, artifacts) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e.into());
        }

        let previous = parent.join(format!("{}.old-{}", name, token));
        let had_previous = self.dir.exists();
        if had_previous {
            if let Err(e) = rename(&self.dir, &previous) {
                let _ = fs::remove_dir_all(&staging);
                return Err(e.into());
            }
        }

        if let Err(e) = rename(&staging, &self.dir) {
            if had_previous {
                if let Err(restore) = rename(&previous, &self.dir) {
                    log::error!("Failed to restore bundle from {}: {}", previous.display(), restore);
                }
            }
            let _ = fs::remove_dir_all(&staging);
            return Err(e.into());
        }

        if had_previous {
            if let Err(e) = fs::remove_dir_all(&previous) {
                log::warn!("Failed to remove replaced bundle {}: {}", previous.display(), e);
            }
        }

        Ok(())
    }
}

fn write_all(dir: &Path, artifacts: &[(&str, &[u8])]) -> std::io::Result<()> {
    for (file, bytes) in artifacts {
        let mut f = fs::File::create(dir.join(file))?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    Ok(())
}

fn read_artifact(path: &Path) -> DetectorResult<Vec<u8>> {
    if !path.is_file() {
        return Err(DetectorError::MissingArtifact(path.to_path_buf()));
    }
    Ok(fs::read(path)?)
}

// ============================================================================
// SAVE / LOAD
// ============================================================================

impl AnomalyDetector {
    /// Persist model, weights, scaler and metrics as one bundle
    pub fn save(&self, bundle: &ModelBundle) -> DetectorResult<()> {
        let trained = self.trained()?;

        let model = ModelArtifact {
            format_version: BUNDLE_FORMAT_VERSION,
            input_dim: self.input_dim,
            layout: (self.input_dim == FEATURE_COUNT).then(LayoutInfo::current),
            architecture: network::architecture(),
        };
        let model_json = serde_json::to_vec_pretty(&model)?;
        let weights = encode_weights(&trained.network)?;
        let scaler_json = serde_json::to_vec_pretty(&trained.scaler)?;

        let mut metrics = trained.metrics.clone();
        metrics.model_sha256 = sha256_hex(&model_json);
        metrics.weights_sha256 = sha256_hex(&weights);
        metrics.scaler_sha256 = sha256_hex(&scaler_json);
        let metrics_json = serde_json::to_vec_pretty(&metrics)?;

        bundle.publish(&[
            (constants::MODEL_FILE, model_json.as_slice()),
            (constants::WEIGHTS_FILE, weights.as_slice()),
            (constants::SCALER_FILE, scaler_json.as_slice()),
            (constants::METRICS_FILE, metrics_json.as_slice()),
        ])?;

        log::info!("Saved model bundle to {}", bundle.dir().display());
        Ok(())
    }

    /// Replace this detector's model and scaler with the bundle's.
    ///
    /// On error the detector keeps its previous state.
    pub fn load(&mut self, bundle: &ModelBundle) -> DetectorResult<()> {
        // Check presence of every artifact before parsing any of them
        let model_bytes = read_artifact(&bundle.model_path())?;
        let weights_bytes = read_artifact(&bundle.weights_path())?;
        let scaler_bytes = read_artifact(&bundle.scaler_path())?;
        let metrics_bytes = read_artifact(&bundle.metrics_path())?;

        let metrics: MetricsSummary = serde_json::from_slice(&metrics_bytes)?;
        if metrics.model_sha256 != sha256_hex(&model_bytes) {
            return Err(DetectorError::IncompatibleBundle(
                "model artifact does not match the metrics digest".into(),
            ));
        }
        if metrics.weights_sha256 != sha256_hex(&weights_bytes) {
            return Err(DetectorError::IncompatibleBundle(
                "weights artifact does not match the metrics digest".into(),
            ));
        }
        if metrics.scaler_sha256 != sha256_hex(&scaler_bytes) {
            return Err(DetectorError::IncompatibleBundle(
                "scaler artifact does not match the metrics digest".into(),
            ));
        }

        let model: ModelArtifact = serde_json::from_slice(&model_bytes)?;
        let scaler: StandardScaler = serde_json::from_slice(&scaler_bytes)?;

        if model.format_version != BUNDLE_FORMAT_VERSION {
            return Err(DetectorError::IncompatibleBundle(format!(
                "unsupported format version {}",
                model.format_version
            )));
        }
        if let Some(layout) = &model.layout {
            if !layout.is_compatible() {
                return Err(DetectorError::IncompatibleBundle(format!(
                    "feature layout v{} ({:08x}) does not match the current layout",
                    layout.version, layout.hash
                )));
            }
        }

        if model.architecture != network::architecture() {
            return Err(DetectorError::IncompatibleBundle(format!(
                "unsupported architecture {:?}",
                model.architecture
            )));
        }

        for bundle_dim in [model.input_dim, scaler.n_features] {
            if bundle_dim != self.input_dim {
                return Err(DetectorError::DimensionMismatch {
                    detector: self.input_dim,
                    bundle: bundle_dim,
                });
            }
        }

        let classifier = decode_weights(self.input_dim, weights_bytes)?;
        if !classifier.has_shapes_for(self.input_dim) || !scaler.is_consistent() {
            return Err(DetectorError::IncompatibleBundle(
                "artifact parameter shapes are inconsistent".into(),
            ));
        }

        self.stage = Stage::Restored(Trained {
            network: classifier,
            scaler,
            metrics,
            history: None,
        });

        log::info!("Loaded model bundle from {}", bundle.dir().display());
        Ok(())
    }

    /// Fresh detector restored from a bundle
    pub fn restore(input_dim: usize, bundle: &ModelBundle) -> DetectorResult<Self> {
        let mut detector = Self::new(input_dim)?;
        detector.load(bundle)?;
        Ok(detector)
    }
}
