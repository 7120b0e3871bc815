//! Prediction handler

use axum::{body::Bytes, extract::State, Json};
use predictor_core::PredictionResult;
use serde_json::Value;

use crate::{AppError, AppResult, AppState};

/// Run a prediction for one instance or a batch.
///
/// The body is parsed as JSON regardless of content type.
pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<PredictionResult>> {
    let payload = parse_body(&body)?;

    let result = state.context.predict(&payload)?;

    tracing::debug!(samples = result.len(), "Prediction served");

    Ok(Json(result))
}

/// Parse the body, treating a blank body or a falsy JSON document as absent
fn parse_body(body: &[u8]) -> AppResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BodyRequired);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::ValidationError(format!("Invalid JSON body: {}", e)))?;

    let empty = match &value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    };

    if empty {
        return Err(AppError::BodyRequired);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::super::testing::{post, request, sum_state, sum_state_failing, sum_state_with_config};
    use crate::config::Config;
    use crate::create_router;
    use axum::http::StatusCode;
    use predictor_core::FeatureSchema;
    use serde_json::json;

    fn schema() -> FeatureSchema {
        FeatureSchema::new(vec!["f1".into(), "f2".into(), "f3".into(), "f4".into()])
    }

    #[tokio::test]
    async fn test_single_positional() {
        let app = create_router(sum_state(schema()));
        let (status, body) = post(app, r#"{"features": [1, 2, 3, 4]}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"prediction": 10.0}));
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let app = create_router(sum_state(schema()));
        let (status, body) = post(app, r#"{"instances": [[1, 2, 3, 4], [0, 0, 0, 0]]}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"predictions": [10.0, 0.0]}));
    }

    #[tokio::test]
    async fn test_named_features() {
        let app = create_router(sum_state(schema()));
        let (status, body) =
            post(app, r#"{"features": {"f4": 4, "f2": 2, "f1": 1, "f3": 3}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"prediction": 10.0}));
    }

    #[tokio::test]
    async fn test_named_without_schema() {
        let app = create_router(sum_state(FeatureSchema::unavailable()));
        let (status, body) = post(app, r#"{"features": {"f1": 1.0}}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("Feature names not available"));
    }

    #[tokio::test]
    async fn test_client_errors() {
        let cases = [
            (r#"{"instances": []}"#, "Empty 'instances' list."),
            (
                r#"{"instances": [[1, 2], {"f1": 1}]}"#,
                "Invalid 'instances' contents. Use list-of-lists or list-of-dicts.",
            ),
            (r#"{"other": 1}"#, "JSON must include 'features' or 'instances'."),
            (r#"{"features": 12}"#, "Invalid 'features' format. Must be list or dict."),
            (r#"{}"#, "JSON body required"),
            ("null", "JSON body required"),
            ("[]", "JSON body required"),
            ("", "JSON body required"),
            ("  \n", "JSON body required"),
        ];

        for (request, message) in cases {
            let app = create_router(sum_state(schema()));
            let (status, body) = post(app, request).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "request: {}", request);
            assert_eq!(body["error"], message, "request: {}", request);
            assert_eq!(body["status"], 400);
        }
    }

    #[tokio::test]
    async fn test_conversion_error_is_client_error() {
        let app = create_router(sum_state(schema()));
        let (status, body) = post(app, r#"{"features": [1, "two", 3, 4]}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("'two'"));
    }

    #[tokio::test]
    async fn test_scaler_mismatch_is_client_error() {
        let app = create_router(sum_state(schema()));
        let (status, body) = post(app, r#"{"features": [1, 2]}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Failed to scale features"));
    }

    #[tokio::test]
    async fn test_model_failure_is_generic_server_error() {
        let app = create_router(sum_state_failing());
        let (status, body) = post(app, r#"{"features": [1, 2, 3, 4]}"#).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Prediction failed", "status": 500}));
    }

    #[tokio::test]
    async fn test_malformed_json_reports_parse_error() {
        for request in ["not json", r#"{"features": [1e400, 1, 1, 1]}"#] {
            let app = create_router(sum_state(schema()));
            let (status, body) = post(app, request).await;

            assert_eq!(status, StatusCode::BAD_REQUEST, "request: {}", request);
            let message = body["error"].as_str().unwrap();
            assert!(message.starts_with("Invalid JSON body: "), "request: {}", request);
        }
    }

    #[tokio::test]
    async fn test_oversized_body_is_json_413() {
        let config = Config {
            max_body_bytes: 16,
            ..Config::default()
        };
        let app = create_router(sum_state_with_config(schema(), config));
        let (status, body) = post(app, r#"{"features": [1, 2, 3, 4, 5, 6, 7, 8]}"#).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({"error": "Request body too large", "status": 413}));
    }

    #[tokio::test]
    async fn test_body_within_limit_is_served() {
        let config = Config {
            max_body_bytes: 64,
            ..Config::default()
        };
        let app = create_router(sum_state_with_config(schema(), config));
        let (status, body) = post(app, r#"{"features": [1, 2, 3, 4]}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"prediction": 10.0}));
    }

    #[tokio::test]
    async fn test_wrong_method_is_json_405() {
        let app = create_router(sum_state(schema()));
        let (status, body) = request(app, "GET", "/predict", "").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method not allowed", "status": 405}));
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let app = create_router(sum_state(schema()));
        let (status, body) = request(app, "POST", "/predictions", "{}").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No route for /predictions");
    }
}
