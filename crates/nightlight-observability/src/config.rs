// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Logging settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Subscriber settings, usually taken from the `[logging]` config section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Base level for everything not named by a debug flag
    pub level: String,

    /// JSON log file (needs the `file-logging` feature); the file lands in a
    /// `run_<timestamp>` folder next to the given path
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Rejected level name
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("unknown log level '{0}' (expected trace, debug, info, warn or error)")]
    Unknown(String),
}

/// Parse a level name, case-insensitively
pub fn parse_level(level: &str) -> Result<tracing::Level, LevelError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(tracing::Level::TRACE),
        "debug" => Ok(tracing::Level::DEBUG),
        "info" => Ok(tracing::Level::INFO),
        "warn" | "warning" => Ok(tracing::Level::WARN),
        "error" => Ok(tracing::Level::ERROR),
        _ => Err(LevelError::Unknown(level.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO"), Ok(tracing::Level::INFO));
        assert_eq!(parse_level(" warning "), Ok(tracing::Level::WARN));
        assert_eq!(parse_level("loud"), Err(LevelError::Unknown("loud".to_string())));
    }

    #[test]
    fn test_default_settings() {
        let settings = LoggingSettings::default();
        assert_eq!(settings.level, "info");
        assert!(settings.file.is_none());
    }
}
