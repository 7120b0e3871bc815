//! Model Module - Inference pipeline and fitted capabilities
//!
//! The pipeline talks to `Predictor` / `Transformer` traits only.
//! Concrete estimators and artifact loading live alongside it.

pub mod capability;
pub mod linear;
pub mod scaler;
pub mod inference;
pub mod artifacts;

// Re-export common types
pub use capability::{FnTransformer, ModelError, Predictor, Transformer};
pub use linear::LinearRegression;
pub use scaler::StandardScaler;
pub use inference::{infer, ModelContext, PipelineError, PredictionResult};
pub use artifacts::{load_context, ArtifactError, ArtifactInfo, ArtifactKind, ArtifactPaths};
