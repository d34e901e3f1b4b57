//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the config as a commented TOML document
    ///
    /// Used for the first-run template and `shici config --reset`.
    pub fn to_toml(&self) -> String {
        format!(
            r#"# shici configuration
# Environment variables override these values:
#   SHICI_API_BASE, SHICI_API_TIMEOUT, SHICI_SESSION_FILE, RUST_LOG

# Backend address (content and account APIs share it)
api_base = {base:?}

# File holding the saved login (token + current user)
session_file = {session_file:?}

# Versioned API prefixes and request timeouts
[api]
content_prefix = {content_prefix:?}
auth_prefix = {auth_prefix:?}
content_timeout_secs = {content_timeout}
auth_timeout_secs = {auth_timeout}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level:?}
# File logging (in addition to stderr)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir:?}
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = {log_file_prefix:?}
"#,
            base = self.api.base_url,
            session_file = self.session_file.display().to_string(),
            content_prefix = self.api.content_prefix,
            auth_prefix = self.api.auth_prefix,
            content_timeout = self.api.content_timeout_secs,
            auth_timeout = self.api.auth_timeout_secs,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display().to_string(),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
        )
    }
}
