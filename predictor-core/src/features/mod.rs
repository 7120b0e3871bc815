//! Features Module - Request payloads to feature matrices
//!
//! Schema lookup and payload normalization, kept apart from the model so
//! the same matrix can be fed to any predictor.

pub mod schema;
pub mod payload;

// Re-export common types
pub use schema::FeatureSchema;
pub use payload::{normalize, FeatureMatrix, Payload, PayloadError, MISSING};
