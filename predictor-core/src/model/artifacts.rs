//! Artifact Loader - fitted model, scaler and feature names from disk
//!
//! Artifacts are JSON documents:
//!
//! ```text
//! model.json          {"kind": "linear_regression", "coef": [..], "intercept": 0.0}   (required)
//! scaler.json         {"kind": "standard_scaler", "mean": [..], "scale": [..]}        (optional)
//! feature_names.json  ["f1", "f2", ...]                                               (optional)
//! ```
//!
//! Everything is read once and frozen into a [`ModelContext`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::inference::ModelContext;
use super::linear::LinearRegression;
use super::scaler::StandardScaler;
use crate::features::FeatureSchema;

pub const MODEL_FILE: &str = "model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const FEATURES_FILE: &str = "feature_names.json";

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Model not found at {0}. Create and save a model artifact before starting the server.")]
    ModelNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid artifact {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

// ============================================================================
// DATA STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Model,
    Scaler,
    FeatureNames,
}

/// What was loaded, from where, and its checksum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: u64,
    pub loaded_at: DateTime<Utc>,
}

/// Serialized model, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LinearRegression(LinearRegression),
}

/// Serialized scaler, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScalerArtifact {
    StandardScaler(StandardScaler),
}

/// Where to look for each artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub features: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            scaler: dir.join(SCALER_FILE),
            features: dir.join(FEATURES_FILE),
        }
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load all artifacts and freeze them into a [`ModelContext`].
///
/// The model is required. A missing scaler or feature-name file is not an
/// error; the service then skips scaling or rejects named input.
pub fn load_context(paths: &ArtifactPaths) -> Result<ModelContext, ArtifactError> {
    if !paths.model.exists() {
        return Err(ArtifactError::ModelNotFound(paths.model.clone()));
    }

    let mut artifacts = Vec::new();

    let (model, info) = read_json::<ModelArtifact>(&paths.model, ArtifactKind::Model)?;
    artifacts.push(info);
    let ModelArtifact::LinearRegression(model) = model;
    let model_width = model.n_features();

    let mut scaler = None;
    if paths.scaler.exists() {
        let (artifact, info) = read_json::<ScalerArtifact>(&paths.scaler, ArtifactKind::Scaler)?;
        let ScalerArtifact::StandardScaler(loaded) = artifact;
        loaded.validate().map_err(|reason| ArtifactError::Invalid {
            path: paths.scaler.clone(),
            reason,
        })?;
        if loaded.n_features() != model_width {
            log::warn!(
                "Scaler expects {} features but model expects {}",
                loaded.n_features(),
                model_width
            );
        }
        artifacts.push(info);
        scaler = Some(loaded);
    } else {
        log::info!("No scaler at {}, features are passed to the model unscaled", paths.scaler.display());
    }

    let mut schema = FeatureSchema::unavailable();
    if paths.features.exists() {
        let (names, info) = read_json::<Vec<String>>(&paths.features, ArtifactKind::FeatureNames)?;
        let loaded = FeatureSchema::new(names);
        if let Some(dup) = loaded.find_duplicate() {
            return Err(ArtifactError::Invalid {
                path: paths.features.clone(),
                reason: format!("duplicate feature name '{}'", dup),
            });
        }
        if loaded.len() != Some(model_width) {
            log::warn!(
                "{} feature names loaded but model expects {} features",
                loaded.len().unwrap_or(0),
                model_width
            );
        }
        artifacts.push(info);
        schema = loaded;
    } else {
        log::info!("No feature names at {}, named input is disabled", paths.features.display());
    }

    let mut context = ModelContext::new(model)
        .with_schema(schema)
        .with_artifacts(artifacts);
    if let Some(scaler) = scaler {
        context = context.with_scaler(scaler);
    }

    Ok(context)
}

fn read_json<T: DeserializeOwned>(
    path: &Path,
    kind: ArtifactKind,
) -> Result<(T, ArtifactInfo), ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value = serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let info = ArtifactInfo {
        kind,
        path: path.to_path_buf(),
        sha256: sha256_hex(&bytes),
        size_bytes: bytes.len() as u64,
        loaded_at: Utc::now(),
    };

    log::info!(
        "Loaded {:?} from {} ({} bytes, sha256 {})",
        kind,
        path.display(),
        info.size_bytes,
        info.sha256
    );

    Ok((value, info))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
