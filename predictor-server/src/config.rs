//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use predictor_core::ArtifactPaths;

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Bind host (IP or hostname)
    pub host: String,

    /// Server port
    pub port: u16,

    /// Fitted model artifact
    pub model_path: PathBuf,

    /// Optional fitted scaler artifact
    pub scaler_path: PathBuf,

    /// Optional ordered feature-name list
    pub features_path: PathBuf,

    /// Largest accepted request body
    pub max_body_bytes: usize,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        let paths = ArtifactPaths::in_dir(".");
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            model_path: paths.model,
            scaler_path: paths.scaler,
            features_path: paths.features,
            max_body_bytes: 1024 * 1024,
            request_timeout_secs: 30,
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup; missing or unparsable
    /// values fall back to the defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let artifact_dir = lookup("ARTIFACT_DIR").map(PathBuf::from);
        let paths = artifact_dir
            .as_deref()
            .map(ArtifactPaths::in_dir)
            .unwrap_or_else(|| ArtifactPaths::in_dir("."));

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),

            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),

            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(paths.model),

            scaler_path: lookup("SCALER_PATH")
                .map(PathBuf::from)
                .unwrap_or(paths.scaler),

            features_path: lookup("FEATURES_PATH")
                .map(PathBuf::from)
                .unwrap_or(paths.features),

            max_body_bytes: lookup("MAX_BODY_BYTES")
                .and_then(|b| b.parse().ok())
                .unwrap_or(defaults.max_body_bytes),

            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|t| t.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),

            log_json: lookup("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
        }
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            model: self.model_path.clone(),
            scaler: self.scaler_path.clone(),
            features: self.features_path.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
