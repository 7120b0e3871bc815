//! Feature Schema - Name to position mapping
//!
//! Holds the ordered feature names the model was trained on (if any)
//! and turns named input into positional rows.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::payload::PayloadError;

/// Ordered, unique feature names, or unknown.
///
/// Immutable once loaded. Only used to map name -> column position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSchema {
    names: Option<Vec<String>>,
}

impl FeatureSchema {
    /// Schema with a known name order
    pub fn new(names: Vec<String>) -> Self {
        Self { names: Some(names) }
    }

    /// Schema with no known name order; named input is rejected
    pub fn unavailable() -> Self {
        Self { names: None }
    }

    pub fn is_available(&self) -> bool {
        self.names.is_some()
    }

    pub fn names(&self) -> Option<&[String]> {
        self.names.as_deref()
    }

    pub fn len(&self) -> Option<usize> {
        self.names.as_ref().map(Vec::len)
    }

    /// First duplicated name, if any
    pub fn find_duplicate(&self) -> Option<&str> {
        let names = self.names.as_ref()?;
        names
            .iter()
            .enumerate()
            .find(|(i, name)| names[..*i].contains(name))
            .map(|(_, name)| name.as_str())
    }

    /// Build a positional row from named values.
    ///
    /// Walks the schema in order; keys absent from `named_values` come back as
    /// `None` (the missing marker) and keys not in the schema are ignored.
    /// `context` names the payload shape for the error message.
    pub fn resolve_row<'a>(
        &self,
        named_values: &'a Map<String, Value>,
        context: &'static str,
    ) -> Result<Vec<Option<&'a Value>>, PayloadError> {
        let names = self
            .names
            .as_ref()
            .ok_or(PayloadError::SchemaUnavailable { context })?;

        Ok(names.iter().map(|name| named_values.get(name)).collect())
    }
}

impl From<Option<Vec<String>>> for FeatureSchema {
    fn from(names: Option<Vec<String>>) -> Self {
        Self { names }
    }
}
