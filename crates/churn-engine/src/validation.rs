//! Request validation errors.
//!
//! Rejected scoring payloads are reported in the pydantic-compatible
//! `detail` shape that clients of the hosting platform already parse:
//! `{"detail": [{"loc": [...], "msg": "...", "type": "..."}]}`.

use serde::Serialize;
use serde_json::Value;

/// A single validation error for one location in the request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    /// Path into the request, e.g. `["body", "input_data", 0, "values", 2]`.
    pub loc: Vec<Value>,
    /// Human-readable error message.
    pub msg: String,
    /// Error type string (e.g. "too_short").
    #[serde(rename = "type")]
    pub error_type: String,
}

impl ValidationError {
    pub fn new(loc: Vec<Value>, msg: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            error_type: error_type.into(),
        }
    }

    /// An error located at the request body as a whole.
    pub fn body(msg: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self::new(vec![Value::from("body")], msg, error_type)
    }
}

/// Render errors as the `{"detail": [...]}` response body.
pub fn detail_body(errors: &[ValidationError]) -> Value {
    serde_json::json!({ "detail": errors })
}
