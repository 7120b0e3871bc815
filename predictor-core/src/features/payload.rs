//! Payload Normalizer - Client JSON to feature matrix
//!
//! Accepted request shapes:
//!
//! ```text
//! {"features": [v1, v2, ...]}             -> single instance, positional
//! {"features": {"f1": v1, ...}}           -> single instance, named
//! {"instances": [[...], [...]]}           -> batch, positional
//! {"instances": [{"f1": v1, ...}, ...]}   -> batch, named
//! ```
//!
//! `features` wins when both keys are present. Named input needs a loaded
//! [`FeatureSchema`]; the schema order defines the columns.

use ndarray::Array2;
use serde_json::{Map, Value};
use thiserror::Error;

use super::schema::FeatureSchema;

/// Rows = samples, columns = features. Missing values are NaN.
pub type FeatureMatrix = Array2<f64>;

/// Marker stored for absent or `null` values
pub const MISSING: f64 = f64::NAN;

// ============================================================================
// ERRORS
// ============================================================================

/// Client-side payload errors. Every variant maps to a 4xx response.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("JSON must include 'features' or 'instances'.")]
    MissingFeatureKey,

    #[error("Invalid 'features' format. Must be list or dict.")]
    InvalidFeatureFormat,

    #[error("Feature names not available on server; send {context} as positional lists.")]
    SchemaUnavailable { context: &'static str },

    #[error("Empty 'instances' list.")]
    EmptyBatch,

    #[error("Invalid 'instances' format. Must be a list.")]
    InvalidInstancesType,

    #[error("Invalid 'instances' contents. Use list-of-lists or list-of-dicts.")]
    MixedInstanceTypes,

    #[error("Could not convert features to numbers at row {row}, column {column}: {reason}")]
    NumericConversionFailed {
        row: usize,
        column: usize,
        reason: String,
    },
}

// ============================================================================
// PAYLOAD SHAPES
// ============================================================================

/// A classified request body, borrowing from the parsed JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload<'a> {
    /// `{"features": [..]}`
    Positional(&'a [Value]),
    /// `{"features": {..}}`
    Named(&'a Map<String, Value>),
    /// `{"instances": [[..], ..]}`
    PositionalBatch(Vec<&'a [Value]>),
    /// `{"instances": [{..}, ..]}`
    NamedBatch(Vec<&'a Map<String, Value>>),
}

impl<'a> Payload<'a> {
    /// Decide which of the accepted shapes `raw` is.
    ///
    /// Only structure is checked here; the schema and numeric values are
    /// checked when the matrix is built.
    pub fn classify(raw: &'a Value) -> Result<Self, PayloadError> {
        let body = raw.as_object().ok_or(PayloadError::MissingFeatureKey)?;

        if let Some(features) = body.get("features") {
            return match features {
                Value::Array(values) => Ok(Payload::Positional(values)),
                Value::Object(named) => Ok(Payload::Named(named)),
                _ => Err(PayloadError::InvalidFeatureFormat),
            };
        }

        let instances = body
            .get("instances")
            .ok_or(PayloadError::MissingFeatureKey)?
            .as_array()
            .ok_or(PayloadError::InvalidInstancesType)?;

        if instances.is_empty() {
            return Err(PayloadError::EmptyBatch);
        }

        if instances.iter().all(Value::is_object) {
            let named = instances.iter().filter_map(Value::as_object).collect();
            Ok(Payload::NamedBatch(named))
        } else if instances.iter().all(Value::is_array) {
            let rows = instances
                .iter()
                .filter_map(Value::as_array)
                .map(Vec::as_slice)
                .collect();
            Ok(Payload::PositionalBatch(rows))
        } else {
            Err(PayloadError::MixedInstanceTypes)
        }
    }

    /// Number of samples (rows) this payload carries
    pub fn n_samples(&self) -> usize {
        match self {
            Payload::Positional(_) | Payload::Named(_) => 1,
            Payload::PositionalBatch(rows) => rows.len(),
            Payload::NamedBatch(rows) => rows.len(),
        }
    }

    /// Build the numeric matrix, resolving named input through `schema`.
    pub fn to_matrix(&self, schema: &FeatureSchema) -> Result<FeatureMatrix, PayloadError> {
        let rows: Vec<Vec<Option<&Value>>> = match self {
            Payload::Positional(values) => vec![values.iter().map(Some).collect()],
            Payload::Named(named) => vec![schema.resolve_row(named, "features")?],
            Payload::PositionalBatch(rows) => rows
                .iter()
                .map(|row| row.iter().map(Some).collect())
                .collect(),
            Payload::NamedBatch(rows) => rows
                .iter()
                .map(|named| schema.resolve_row(named, "instances"))
                .collect::<Result<_, _>>()?,
        };

        build_matrix(&rows)
    }
}

/// Classify `raw` and build its feature matrix.
pub fn normalize(raw: &Value, schema: &FeatureSchema) -> Result<FeatureMatrix, PayloadError> {
    Payload::classify(raw)?.to_matrix(schema)
}

// ============================================================================
// NUMERIC CONVERSION
// ============================================================================

fn build_matrix(rows: &[Vec<Option<&Value>>]) -> Result<FeatureMatrix, PayloadError> {
    let width = rows.first().map(Vec::len).unwrap_or(0);
    let mut data = Vec::with_capacity(rows.len() * width);

    for (row_idx, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(PayloadError::NumericConversionFailed {
                row: row_idx,
                column: row.len().min(width),
                reason: format!("row has {} values, expected {}", row.len(), width),
            });
        }

        for (col_idx, cell) in row.iter().enumerate() {
            let value = cell_to_f64(*cell).map_err(|reason| PayloadError::NumericConversionFailed {
                row: row_idx,
                column: col_idx,
                reason,
            })?;
            data.push(value);
        }
    }

    Array2::from_shape_vec((rows.len(), width), data).map_err(|e| {
        PayloadError::NumericConversionFailed {
            row: 0,
            column: 0,
            reason: e.to_string(),
        }
    })
}

/// Convert one JSON cell to `f64`.
///
/// Absent and `null` become [`MISSING`]. Booleans are 1/0, numeric strings
/// are parsed. Nested containers and other strings are rejected.
fn cell_to_f64(cell: Option<&Value>) -> Result<f64, String> {
    match cell {
        None | Some(Value::Null) => Ok(MISSING),
        Some(Value::Bool(b)) => Ok(if *b { 1.0 } else { 0.0 }),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| format!("number {} is out of range", n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("could not convert string to float: '{}'", s)),
        Some(Value::Array(_)) => Err("nested list is not a number".to_string()),
        Some(Value::Object(_)) => Err("nested object is not a number".to_string()),
    }
}
