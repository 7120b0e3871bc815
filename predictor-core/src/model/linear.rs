//! Linear Regression - `y = X · coef + intercept`

use ndarray::{Array1, ArrayD};
use serde::{Deserialize, Serialize};

use super::capability::{ensure_finite, ensure_width, ModelError, Predictor};
use crate::features::FeatureMatrix;

/// Fitted ordinary least squares model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub coef: Vec<f64>,
    #[serde(default)]
    pub intercept: f64,
}

impl LinearRegression {
    pub fn new(coef: Vec<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    pub fn n_features(&self) -> usize {
        self.coef.len()
    }
}

impl Predictor for LinearRegression {
    fn predict(&self, x: &FeatureMatrix) -> Result<ArrayD<f64>, ModelError> {
        ensure_width(x, self.coef.len(), "LinearRegression")?;
        ensure_finite(x)?;

        let coef = Array1::from(self.coef.clone());
        let y = x.dot(&coef) + self.intercept;

        Ok(y.into_dyn())
    }

    fn name(&self) -> &str {
        "LinearRegression"
    }
}
