//! Router test helpers

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use ndarray::{ArrayD, Axis};
use predictor_core::{FeatureMatrix, FeatureSchema, ModelContext, ModelError, StandardScaler};
use serde_json::Value;
use tower::ServiceExt;

use crate::{config::Config, AppState};

fn sum_model(x: &FeatureMatrix) -> Result<ArrayD<f64>, ModelError> {
    Ok(x.sum_axis(Axis(1)).into_dyn())
}

fn failing_model(_: &FeatureMatrix) -> Result<ArrayD<f64>, ModelError> {
    Err(ModelError::Other("weights corrupted".to_string()))
}

fn state(context: ModelContext) -> AppState {
    AppState {
        context: Arc::new(context),
        config: Config::default(),
    }
}

/// Row-sum model behind a 4-wide identity scaler
pub fn sum_state(schema: FeatureSchema) -> AppState {
    state(
        ModelContext::new(sum_model)
            .with_scaler(StandardScaler::new(vec![0.0; 4], vec![1.0; 4]))
            .with_schema(schema),
    )
}

/// Row-sum model with a custom configuration
pub fn sum_state_with_config(schema: FeatureSchema, config: Config) -> AppState {
    AppState {
        config,
        ..sum_state(schema)
    }
}

/// Model that always fails
pub fn sum_state_failing() -> AppState {
    state(ModelContext::new(failing_model))
}

pub async fn post(app: Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn request(app: Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}
