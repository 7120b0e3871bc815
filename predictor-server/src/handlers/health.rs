//! Health check handler

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use predictor_core::model::{ArtifactInfo, ArtifactKind};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model: String,
    scaler_loaded: bool,
    features: Option<Vec<String>>,
    artifacts: Vec<ArtifactSummary>,
    version: &'static str,
    timestamp: i64,
}

/// Loaded artifact without its server-side path
#[derive(Serialize)]
pub struct ArtifactSummary {
    kind: ArtifactKind,
    sha256: String,
    size_bytes: u64,
    loaded_at: DateTime<Utc>,
}

impl From<&ArtifactInfo> for ArtifactSummary {
    fn from(info: &ArtifactInfo) -> Self {
        Self {
            kind: info.kind,
            sha256: info.sha256.clone(),
            size_bytes: info.size_bytes,
            loaded_at: info.loaded_at,
        }
    }
}

/// Load status and the known feature names (`null` when none were loaded)
pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let context = &state.context;

    Json(HealthResponse {
        status: "ok",
        model_loaded: true,
        model: context.predictor_name().to_string(),
        scaler_loaded: context.has_scaler(),
        features: context.schema().names().map(<[String]>::to_vec),
        artifacts: context.artifacts().iter().map(ArtifactSummary::from).collect(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().timestamp(),
    })
}
