//! Regression Predictor - Core
//!
//! Turns client JSON into a feature matrix and runs it through a fitted
//! regression model.
//!
//! ```text
//! JSON payload ──► Payload::classify ──► FeatureMatrix ──► [scaler] ──► model ──► PredictionResult
//!                        │
//!                  FeatureSchema (named input)
//! ```

pub mod features;
pub mod model;

pub use features::{normalize, FeatureMatrix, FeatureSchema, Payload, PayloadError};
pub use model::{
    infer, load_context, ArtifactError, ArtifactPaths, LinearRegression, ModelContext, ModelError,
    PipelineError, PredictionResult, Predictor, StandardScaler, Transformer,
};
