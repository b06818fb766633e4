use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error body returned by the shopping backend. Different endpoints fill
/// different fields; `detail` is either a string or an object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ApiError {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            message: Some(message.into()),
            detail: None,
        }
    }

    /// Best human-readable description, preferring `detail`.
    pub fn describe(&self) -> Option<String> {
        let from_detail = match &self.detail {
            Some(Value::String(text)) if !text.is_empty() => Some(text.clone()),
            Some(Value::Object(fields)) => ["message", "error"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_str))
                .filter(|text| !text.is_empty())
                .map(str::to_string),
            _ => None,
        };

        from_detail
            .or_else(|| self.message.clone().filter(|text| !text.is_empty()))
            .or_else(|| self.error.clone().filter(|text| !text.is_empty()))
    }
}

#[derive(Debug, Error)]
#[error("backend returned {status}: {message}")]
pub struct ApiException {
    pub status: u16,
    pub message: String,
}

impl ApiException {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn from_body(status: u16, body: &ApiError, fallback: &str) -> Self {
        Self::new(status, body.describe().unwrap_or_else(|| fallback.to_string()))
    }
}
