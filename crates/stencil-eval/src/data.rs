//! Data passed to a render call.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::error::{RenderError, Result};
use crate::value::Value;

/// Top-level template parameters, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateData {
    params: HashMap<String, Value>,
}

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(name.into(), value.into());
    }

    /// Look up `$a.b.c`. Missing parameters and fields yield `None`.
    pub fn get_path(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        self.params.get(first)?.get_path(rest)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parse data from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| RenderError::InvalidData(format!("JSON parse error: {}", e)))?;
        Self::try_from(value)
    }
}

impl From<HashMap<String, Value>> for TemplateData {
    fn from(params: HashMap<String, Value>) -> Self {
        Self { params }
    }
}

impl TryFrom<JsonValue> for TemplateData {
    type Error = RenderError;

    fn try_from(json: JsonValue) -> Result<Self> {
        match Value::from(json) {
            Value::Object(params) => Ok(Self { params }),
            other => Err(RenderError::InvalidData(format!(
                "expected an object, found {}",
                other.to_string_value()
            ))),
        }
    }
}
