use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single field value read out of a record or patient document.
///
/// Only strings, numbers and booleans are scalars. A missing field, JSON `null`,
/// arrays and objects are represented by the caller as `None` ("absent"), so
/// `0`, `false` and `""` always stay distinguishable from a missing value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(f64),
    String(String),
}

impl Scalar {
    /// Convert a JSON node into a scalar, returning None for non-scalar nodes.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Scalar::Number),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Numeric view; strings are never parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// `false`, `0`, `NaN` and the empty string.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Bool(b) => !b,
            Scalar::Number(n) => *n == 0.0 || n.is_nan(),
            Scalar::String(s) => s.is_empty(),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value as f64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}
