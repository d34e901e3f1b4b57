//! The `{success, data, error}` wrapper every backend response uses

use serde::{Deserialize, Serialize};

/// Response envelope
///
/// Content endpoints fill `success`, `data` and `error`; account endpoints
/// also send `code` and `timestamp`. Everything except `success` may be
/// missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            code: None,
            timestamp: None,
        }
    }

    /// Failed envelope carrying an error message
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
            code: None,
            timestamp: None,
        }
    }

    /// Unwrap `data`, or return the server error
    ///
    /// `default_message` is used when the server reported failure without
    /// saying why, or claimed success without sending data.
    pub fn into_result(self, default_message: &str) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            _ => Err(self
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| default_message.to_string())),
        }
    }
}
