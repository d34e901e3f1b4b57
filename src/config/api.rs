//! Backend API configuration: base address, version prefixes, timeouts
//!
//! Content endpoints (poems, authors, search) live under the v1 prefix and
//! account endpoints (auth, users) under v2. Both share one base address so
//! there is a single place to point the client at a different backend.

use serde::Deserialize;
use std::time::Duration;

use super::DEFAULT_API_BASE;

/// API configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    /// Backend address, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Path prefix for content endpoints
    pub content_prefix: String,
    /// Path prefix for auth and user endpoints
    pub auth_prefix: String,
    /// Timeout for content requests (seconds)
    pub content_timeout_secs: u64,
    /// Timeout for auth requests (seconds)
    pub auth_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            content_prefix: "/api/v1".to_string(),
            auth_prefix: "/api/v2".to_string(),
            content_timeout_secs: 30,
            auth_timeout_secs: 10,
        }
    }
}

/// API settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileApi {
    pub content_prefix: Option<String>,
    pub auth_prefix: Option<String>,
    pub content_timeout_secs: Option<u64>,
    pub auth_timeout_secs: Option<u64>,
}

impl ApiConfig {
    /// Create from file config with defaults
    ///
    /// `timeout_override` (from the environment) replaces both timeouts.
    pub fn from_file(base_url: String, file: Option<FileApi>, timeout_override: Option<u64>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            content_prefix: file.content_prefix.unwrap_or(defaults.content_prefix),
            auth_prefix: file.auth_prefix.unwrap_or(defaults.auth_prefix),
            content_timeout_secs: timeout_override
                .or(file.content_timeout_secs)
                .unwrap_or(defaults.content_timeout_secs),
            auth_timeout_secs: timeout_override
                .or(file.auth_timeout_secs)
                .unwrap_or(defaults.auth_timeout_secs),
        }
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_timeout_secs)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }
}
