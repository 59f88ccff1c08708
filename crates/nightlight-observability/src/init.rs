// Copyright 2025 Nightlight Contributors
// SPDX-License-Identifier: Apache-2.0

//! Subscriber installation
//!
//! Console output is always on. With `file-logging`, a JSON file is added
//! in a timestamped run folder:
//! ```text
//! ./logs/
//!   └── run_20250101_120000/
//!       └── nightlight.log
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;
use crate::config::{parse_level, LoggingSettings};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer alive; logs are flushed when it drops
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
    log_file: Option<PathBuf>,
}

impl LoggingGuard {
    /// Resolved log file, if file logging is active
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Build the filter for a set of debug flags and a base level
pub fn build_filter(debug_flags: &CrateDebugFlags, settings: &LoggingSettings) -> Result<EnvFilter> {
    let level = parse_level(&settings.level)?;
    let directives = debug_flags.to_filter_string(&level.to_string().to_ascii_lowercase());
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter '{}'", directives))
}

/// Where a log file lands for a run started at `started`
pub fn run_log_path(file: &Path, started: DateTime<Utc>) -> PathBuf {
    let base = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "nightlight.log".into());
    base.join(format!("run_{}", started.format("%Y%m%d_%H%M%S")))
        .join(name)
}

/// Create the run folder for a log file and return the file's full path
pub fn prepare_log_file(file: &Path) -> Result<PathBuf> {
    let path = run_log_path(file, Utc::now());
    if let Some(folder) = path.parent() {
        std::fs::create_dir_all(folder)
            .with_context(|| format!("Failed to create log directory: {}", folder.display()))?;
    }
    Ok(path)
}

/// Install the global subscriber
///
/// # Arguments
/// * `debug_flags` - Per-crate debug flags
/// * `settings` - Base level and optional log file
///
/// Fails if the level is unknown, the log folder can't be created, or a
/// subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, settings: &LoggingSettings) -> Result<LoggingGuard> {
    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(build_filter(debug_flags, settings)?)
        .boxed();
    layers.push(console_layer);

    #[cfg(feature = "file-logging")]
    let (file_guard, log_file) = match &settings.file {
        Some(file) => {
            let path = prepare_log_file(file)?;
            let folder = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or_else(|| "nightlight.log".as_ref());
            let appender = tracing_appender::rolling::daily(folder, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(build_filter(debug_flags, settings)?)
                .boxed();
            layers.push(file_layer);
            (Some(guard), Some(path))
        }
        None => (None, None),
    };

    #[cfg(not(feature = "file-logging"))]
    let log_file: Option<PathBuf> = None;

    Registry::default()
        .with(layers)
        .try_init()
        .context("A global tracing subscriber is already installed")?;

    #[cfg(not(feature = "file-logging"))]
    if let Some(file) = &settings.file {
        tracing::warn!(
            "log file {} ignored: built without the file-logging feature",
            file.display()
        );
    }

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guard: file_guard,
        log_file,
    })
}

/// Install the subscriber with default settings
pub fn init_logging_default(debug_flags: &CrateDebugFlags) -> Result<LoggingGuard> {
    init_logging(debug_flags, &LoggingSettings::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_filter_rejects_unknown_level() {
        let settings = LoggingSettings {
            level: "chatty".to_string(),
            file: None,
        };
        assert!(build_filter(&CrateDebugFlags::default(), &settings).is_err());
    }

    #[test]
    fn test_build_filter_with_debug_flags() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-nightlight-core".to_string()]);
        let filter = build_filter(&flags, &LoggingSettings::default()).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("nightlight_core=debug"));
    }

    #[test]
    fn test_run_log_path() {
        let started = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(
            run_log_path(Path::new("logs/node.log"), started),
            PathBuf::from("logs/run_20250101_120000/node.log")
        );
        assert_eq!(
            run_log_path(Path::new("node.log"), started),
            PathBuf::from("./run_20250101_120000/node.log")
        );
    }

    #[test]
    fn test_prepare_log_file_creates_run_folder() {
        let dir = tempfile::tempdir().unwrap();
        let path = prepare_log_file(&dir.path().join("nightlight.log")).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert_eq!(path.file_name().unwrap(), "nightlight.log");
    }
}
