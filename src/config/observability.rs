//! `[logging]` section: level filter and the optional JSON log file

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// How often the JSON log file starts over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogRotation {
    Hourly,
    #[default]
    Daily,
    Never,
}

const ROTATION_NAMES: [(LogRotation, &str); 3] = [
    (LogRotation::Hourly, "hourly"),
    (LogRotation::Daily, "daily"),
    (LogRotation::Never, "never"),
];

impl LogRotation {
    /// Case-insensitive; anything unrecognized means daily
    pub fn parse(name: &str) -> Self {
        ROTATION_NAMES
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name.trim()))
            .map(|(rotation, _)| *rotation)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        ROTATION_NAMES
            .iter()
            .find(|(rotation, _)| rotation == self)
            .map(|(_, name)| *name)
            .unwrap_or("daily")
    }
}

impl fmt::Display for LogRotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effective logging settings
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for the `shici` target when RUST_LOG is unset
    pub level: String,
    /// Also write JSON lines to `file_dir`
    pub file_enabled: bool,
    pub file_dir: PathBuf,
    pub file_rotation: LogRotation,
    /// Log files are named `<prefix>.<date>`
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            file_enabled: false,
            file_dir: PathBuf::from("./logs"),
            file_rotation: LogRotation::default(),
            file_prefix: "shici".into(),
        }
    }
}

/// `[logging]` as written in config.toml; every key optional
#[derive(Debug, Deserialize, Default)]
pub struct FileLogging {
    pub level: Option<String>,
    pub file_enabled: Option<bool>,
    pub file_dir: Option<String>,
    pub file_rotation: Option<String>,
    pub file_prefix: Option<String>,
}

impl LoggingConfig {
    /// Defaults with whatever the file sets laid on top
    pub fn from_file(file: Option<FileLogging>) -> Self {
        let mut config = Self::default();
        let Some(file) = file else {
            return config;
        };

        if let Some(level) = file.level {
            config.level = level;
        }
        if let Some(enabled) = file.file_enabled {
            config.file_enabled = enabled;
        }
        if let Some(dir) = file.file_dir {
            config.file_dir = dir.into();
        }
        if let Some(rotation) = file.file_rotation.as_deref() {
            config.file_rotation = LogRotation::parse(rotation);
        }
        if let Some(prefix) = file.file_prefix {
            config.file_prefix = prefix;
        }
        config
    }
}
