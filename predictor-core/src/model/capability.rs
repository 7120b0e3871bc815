//! Model capabilities - predict and transform
//!
//! The pipeline only sees these traits, so a fitted linear model, a
//! scaler, or a test closure can all be plugged in.

use ndarray::ArrayD;
use thiserror::Error;

use crate::features::FeatureMatrix;

/// Failure raised by a model or scaler call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("X has {got} features, but {estimator} is expecting {expected} features as input.")]
    FeatureCountMismatch {
        estimator: &'static str,
        got: usize,
        expected: usize,
    },

    #[error("Input contains NaN or infinity at row {row}, column {column}.")]
    NonFiniteInput { row: usize, column: usize },

    #[error("{0}")]
    Other(String),
}

/// `predict(matrix) -> values`, one value per row.
///
/// The output may have any dimensionality; the pipeline flattens it in
/// row-major order.
pub trait Predictor: Send + Sync {
    fn predict(&self, x: &FeatureMatrix) -> Result<ArrayD<f64>, ModelError>;

    fn name(&self) -> &str {
        "predictor"
    }
}

/// `transform(matrix) -> matrix`, a fitted rescaling of the features.
pub trait Transformer: Send + Sync {
    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix, ModelError>;

    fn name(&self) -> &str {
        "transformer"
    }
}

impl<F> Predictor for F
where
    F: Fn(&FeatureMatrix) -> Result<ArrayD<f64>, ModelError> + Send + Sync,
{
    fn predict(&self, x: &FeatureMatrix) -> Result<ArrayD<f64>, ModelError> {
        self(x)
    }
}

/// Wraps a closure as a [`Transformer`].
///
/// Closures already implement [`Predictor`], and the two signatures differ
/// only in return type, so transforms need an explicit wrapper.
pub struct FnTransformer<F>(pub F);

impl<F> Transformer for FnTransformer<F>
where
    F: Fn(&FeatureMatrix) -> Result<FeatureMatrix, ModelError> + Send + Sync,
{
    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix, ModelError> {
        (self.0)(x)
    }
}

/// Reject matrices containing NaN or infinity
pub fn ensure_finite(x: &FeatureMatrix) -> Result<(), ModelError> {
    match x.indexed_iter().find(|(_, v)| !v.is_finite()) {
        Some(((row, column), _)) => Err(ModelError::NonFiniteInput { row, column }),
        None => Ok(()),
    }
}

/// Check the column count against what an estimator was fitted on
pub fn ensure_width(
    x: &FeatureMatrix,
    expected: usize,
    estimator: &'static str,
) -> Result<(), ModelError> {
    if x.ncols() != expected {
        return Err(ModelError::FeatureCountMismatch {
            estimator,
            got: x.ncols(),
            expected,
        });
    }
    Ok(())
}
