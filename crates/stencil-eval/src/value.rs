//! Runtime values for the stencil interpreter.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value as JsonValue;
use stencil_tree::format_number;

/// A data value passed to or computed by a template.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The null value, also the result of a missing data reference.
    #[default]
    Null,
    String(String),
    /// Numbers are always f64, as in JavaScript.
    Number(f64),
    Boolean(bool),
    Array(Vec<Value>),
    /// An object with string keys.
    Object(HashMap<String, Value>),
}

impl Value {
    /// Coerce this value to the string a print site writes.
    pub fn to_string_value(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::String(s) => s.clone(),
            Value::Number(n) => {
                if n.is_nan() {
                    "NaN".to_string()
                } else if n.is_infinite() {
                    if *n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
                } else {
                    format_number(*n)
                }
            }
            Value::Boolean(b) => b.to_string(),
            Value::Array(arr) => {
                let items: Vec<String> = arr.iter().map(Value::to_string_value).collect();
                items.join(", ")
            }
            Value::Object(_) => "[object Object]".to_string(),
        }
    }

    /// Coerce this value to a boolean, with JavaScript truthiness.
    pub fn to_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Boolean(b) => *b,
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Template `==`: numbers compare numerically, a string compared with a
    /// number or boolean compares by string form, everything else structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(s), other @ (Value::Number(_) | Value::Boolean(_)))
            | (other @ (Value::Number(_) | Value::Boolean(_)), Value::String(s)) => {
                *s == other.to_string_value()
            }
            (a, b) => a == b,
        }
    }

    /// Follow a dotted data path through nested objects.
    pub fn get_path(&self, path: &[String]) -> Option<&Value> {
        path.iter().try_fold(self, |value, key| match value {
            Value::Object(map) => map.get(key),
            _ => None,
        })
    }

    /// Convert this value to a serde_json value.
    pub fn to_json_value(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Array(arr) => JsonValue::Array(arr.iter().map(Value::to_json_value).collect()),
            Value::Object(obj) => {
                let map: serde_json::Map<String, JsonValue> = obj
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect();
                JsonValue::Object(map)
            }
        }
    }
}

impl From<JsonValue> for Value {
    fn from(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(b),
            JsonValue::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            JsonValue::String(s) => Value::String(s),
            JsonValue::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            JsonValue::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}
