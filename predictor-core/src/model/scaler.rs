//! Standard Scaler - `(x - mean) / scale` per column

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::capability::{ensure_width, ModelError, Transformer};
use crate::features::FeatureMatrix;

/// Fitted per-feature standardization
///
/// A zero scale (constant feature at fit time) divides by 1. NaN passes
/// through untouched so the model decides how to treat missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Mean and scale must describe the same columns
    pub fn validate(&self) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "mean has {} entries but scale has {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        Ok(())
    }
}

impl Transformer for StandardScaler {
    fn transform(&self, x: &FeatureMatrix) -> Result<FeatureMatrix, ModelError> {
        self.validate().map_err(ModelError::Other)?;
        ensure_width(x, self.mean.len(), "StandardScaler")?;

        let mean = Array1::from(self.mean.clone());
        let scale: Array1<f64> = self
            .scale
            .iter()
            .map(|&s| if s == 0.0 { 1.0 } else { s })
            .collect();

        Ok((x - &mean) / &scale)
    }

    fn name(&self) -> &str {
        "StandardScaler"
    }
}
