//! Client error types and server message extraction

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the poetry backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    /// Base URL plus path did not form a valid URL
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Connection refused, DNS failure, reset, ...
    #[error("request failed: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Server rejected the credentials (HTTP 401); the local session has been expired
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any other non-success status
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Successful status but the body did not match the expected shape
    #[error("response parsing failed: {0}")]
    Decode(String),
}

impl ApiError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }

    /// The message a user should see: the server-provided text when there
    /// is one, otherwise the error itself
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized { message } | Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Pick the most useful message out of an error response body
///
/// Envelope bodies carry `error` (or occasionally `message`); anything else
/// is surfaced raw. Empty bodies fall back to the status reason phrase.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let from_envelope = ["error", "message"].iter().find_map(|key| {
            value
                .get(key)
                .and_then(serde_json::Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        });
        if let Some(message) = from_envelope {
            return message;
        }
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
