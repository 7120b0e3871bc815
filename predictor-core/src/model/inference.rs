//! Inference Pipeline - scale, predict, reshape
//!
//! Runs a normalized feature matrix through the optional scaler and the
//! model, and shapes the output the way the HTTP API returns it.
//!
//! All model state lives in an immutable [`ModelContext`] built once at
//! startup; every call is a pure function of that context and the payload.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::artifacts::ArtifactInfo;
use super::capability::{ModelError, Predictor, Transformer};
use crate::features::{FeatureMatrix, FeatureSchema, Payload, PayloadError};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Prediction output.
///
/// Serializes as `{"prediction": x}` for one sample and
/// `{"predictions": [..]}` for several.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PredictionResult {
    #[serde(rename = "prediction")]
    Single(f64),
    #[serde(rename = "predictions")]
    Batch(Vec<f64>),
}

impl PredictionResult {
    /// Number of predicted values
    pub fn len(&self) -> usize {
        match self {
            PredictionResult::Single(_) => 1,
            PredictionResult::Batch(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values in row order
    pub fn values(&self) -> Vec<f64> {
        match self {
            PredictionResult::Single(v) => vec![*v],
            PredictionResult::Batch(values) => values.clone(),
        }
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    /// Scaler rejected the matrix, almost always a wrong feature count or type
    #[error("Failed to scale features: {0}")]
    ScalingFailed(ModelError),

    /// Model call failed; the cause stays server-side
    #[error("Prediction failed: {0}")]
    InferenceFailed(ModelError),
}

impl PipelineError {
    /// `true` when the request itself is at fault (4xx)
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PipelineError::InferenceFailed(_))
    }
}

// ============================================================================
// CONTEXT
// ============================================================================

/// Model, scaler and schema, loaded once and never mutated.
pub struct ModelContext {
    predictor: Box<dyn Predictor>,
    scaler: Option<Box<dyn Transformer>>,
    schema: FeatureSchema,
    artifacts: Vec<ArtifactInfo>,
}

impl ModelContext {
    pub fn new(predictor: impl Predictor + 'static) -> Self {
        Self {
            predictor: Box::new(predictor),
            scaler: None,
            schema: FeatureSchema::unavailable(),
            artifacts: Vec::new(),
        }
    }

    pub fn with_scaler(mut self, scaler: impl Transformer + 'static) -> Self {
        self.scaler = Some(Box::new(scaler));
        self
    }

    pub fn with_schema(mut self, schema: FeatureSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_artifacts(mut self, artifacts: Vec<ArtifactInfo>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn has_scaler(&self) -> bool {
        self.scaler.is_some()
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    pub fn artifacts(&self) -> &[ArtifactInfo] {
        &self.artifacts
    }

    /// Normalize a raw JSON payload and run it through the model
    pub fn predict(&self, raw: &Value) -> Result<PredictionResult, PipelineError> {
        let payload = Payload::classify(raw)?;
        log::debug!("Normalizing {} sample(s)", payload.n_samples());

        let matrix = payload.to_matrix(&self.schema)?;
        infer(&matrix, self.scaler.as_deref(), self.predictor.as_ref())
    }
}

impl std::fmt::Debug for ModelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelContext")
            .field("predictor", &self.predictor.name())
            .field("scaler", &self.scaler.as_ref().map(|s| s.name()))
            .field("schema", &self.schema)
            .field("artifacts", &self.artifacts)
            .finish()
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Scale (if a scaler is given), predict, and reshape.
///
/// One input row yields [`PredictionResult::Single`], anything else
/// [`PredictionResult::Batch`]. Feature counts are not checked up front;
/// the scaler or model reports a mismatch.
pub fn infer(
    matrix: &FeatureMatrix,
    scale: Option<&dyn Transformer>,
    predict: &dyn Predictor,
) -> Result<PredictionResult, PipelineError> {
    let scaled;
    let input = match scale {
        Some(scaler) => {
            scaled = scaler.transform(matrix).map_err(|e| {
                log::debug!("{} rejected input {:?}: {}", scaler.name(), matrix.shape(), e);
                PipelineError::ScalingFailed(e)
            })?;
            &scaled
        }
        None => matrix,
    };

    let raw = predict.predict(input).map_err(|e| {
        log::debug!("{} failed on input {:?}: {}", predict.name(), input.shape(), e);
        PipelineError::InferenceFailed(e)
    })?;

    let values: Vec<f64> = raw.iter().copied().collect();

    if matrix.nrows() == 1 {
        let first = values.first().copied().ok_or_else(|| {
            log::debug!("{} returned no values", predict.name());
            PipelineError::InferenceFailed(ModelError::Other("model returned no values".to_string()))
        })?;
        return Ok(PredictionResult::Single(first));
    }

    if values.len() != matrix.nrows() {
        log::warn!(
            "{} returned {} values for {} rows",
            predict.name(),
            values.len(),
            matrix.nrows()
        );
    }

    Ok(PredictionResult::Batch(values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::capability::FnTransformer;
    use crate::model::{LinearRegression, StandardScaler};
    use ndarray::{array, Array2, ArrayD, Axis};
    use serde_json::json;

    fn sum_model(x: &FeatureMatrix) -> Result<ArrayD<f64>, ModelError> {
        Ok(x.sum_axis(Axis(1)).into_dyn())
    }

    fn identity(x: &FeatureMatrix) -> Result<FeatureMatrix, ModelError> {
        Ok(x.clone())
    }

    fn schema(names: &[&str]) -> FeatureSchema {
        FeatureSchema::new(names.iter().map(|s| s.to_string()).collect())
    }

    fn sum_context() -> ModelContext {
        ModelContext::new(sum_model)
            .with_scaler(FnTransformer(identity))
            .with_schema(schema(&["f1", "f2", "f3", "f4"]))
    }

    #[test]
    fn test_batch_sum_scenario() {
        let result = sum_context()
            .predict(&json!({"instances": [[1, 2, 3, 4], [0, 0, 0, 0]]}))
            .unwrap();

        assert_eq!(result, PredictionResult::Batch(vec![10.0, 0.0]));
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"predictions": [10.0, 0.0]}));
    }

    #[test]
    fn test_single_row_is_scalar() {
        let result = sum_context().predict(&json!({"features": [1, 1, 1, 1]})).unwrap();

        assert_eq!(result, PredictionResult::Single(4.0));
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"prediction": 4.0}));
    }

    #[test]
    fn test_batch_of_one_is_scalar() {
        let result = sum_context().predict(&json!({"instances": [[2, 2, 2, 2]]})).unwrap();
        assert_eq!(result, PredictionResult::Single(8.0));
    }

    #[test]
    fn test_named_batch_keeps_order() {
        let result = sum_context()
            .predict(&json!({"instances": [
                {"f1": 1, "f2": 1, "f3": 1, "f4": 1},
                {"f4": 5, "f3": 0, "f2": 0, "f1": 0},
                {"f1": 3, "f2": 3, "f3": 3, "f4": 3},
            ]}))
            .unwrap();

        assert_eq!(result.values(), vec![4.0, 5.0, 12.0]);
    }

    #[test]
    fn test_scaler_applied_before_model() {
        let model = LinearRegression::new(vec![1.0, 1.0], 0.0);
        let scaler = StandardScaler::new(vec![1.0, 1.0], vec![2.0, 2.0]);

        let result = infer(&array![[3.0, 5.0]], Some(&scaler), &model).unwrap();
        assert_eq!(result, PredictionResult::Single(3.0));
    }

    #[test]
    fn test_scaling_failure_is_client_error() {
        let scaler = StandardScaler::new(vec![0.0; 4], vec![1.0; 4]);
        let err = infer(&array![[1.0, 2.0]], Some(&scaler), &sum_model).unwrap_err();

        assert!(matches!(err, PipelineError::ScalingFailed(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_model_failure_is_server_error() {
        let model = LinearRegression::new(vec![1.0; 4], 0.0);
        let err = infer(&array![[1.0, 2.0]], None, &model).unwrap_err();

        assert!(matches!(err, PipelineError::InferenceFailed(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_missing_value_reaches_model() {
        let context = ModelContext::new(LinearRegression::new(vec![1.0, 1.0], 0.0))
            .with_schema(schema(&["f1", "f2"]));
        let err = context.predict(&json!({"features": {"f1": 1}})).unwrap_err();

        assert_eq!(
            err,
            PipelineError::InferenceFailed(ModelError::NonFiniteInput { row: 0, column: 1 })
        );
    }

    #[test]
    fn test_empty_model_output() {
        let empty = |_: &FeatureMatrix| -> Result<ArrayD<f64>, ModelError> {
            Ok(Array2::<f64>::zeros((0, 1)).into_dyn())
        };
        let err = infer(&array![[1.0]], None, &empty).unwrap_err();
        assert!(matches!(err, PipelineError::InferenceFailed(ModelError::Other(_))));
    }

    #[test]
    fn test_column_output_is_flattened() {
        let column = |x: &FeatureMatrix| -> Result<ArrayD<f64>, ModelError> {
            Ok(x.sum_axis(Axis(1)).insert_axis(Axis(1)).into_dyn())
        };
        let result = infer(&array![[1.0, 2.0], [3.0, 4.0]], None, &column).unwrap();
        assert_eq!(result, PredictionResult::Batch(vec![3.0, 7.0]));
    }

    #[test]
    fn test_payload_errors_pass_through() {
        let err = sum_context().predict(&json!({"instances": []})).unwrap_err();

        assert_eq!(err, PipelineError::Payload(PayloadError::EmptyBatch));
        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "Empty 'instances' list.");
    }

    #[test]
    fn test_named_input_without_schema() {
        let context = ModelContext::new(sum_model);
        let err = context.predict(&json!({"features": {"f1": 1.0}})).unwrap_err();

        assert!(matches!(err, PipelineError::Payload(PayloadError::SchemaUnavailable { .. })));
        assert!(err.is_client_error());
    }
}
