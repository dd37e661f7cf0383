//! Logging setup.
//!
//! Human-readable logs go to stderr. When a log directory is configured a
//! daily-rolling plain-text log file is written as well. `RUST_LOG` overrides
//! the configured level.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Prefix of the rolling log file.
pub const LOG_FILE_PREFIX: &str = "addonrepo.log";

/// Errors installing the logger.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDirectory { path: PathBuf, source: io::Error },

    #[error("failed to install logger: {0}")]
    Init(String),
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Level filter (trace, debug, info, warn, error, off).
    pub level: String,

    /// Directory for rolling log files. `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

impl LogConfig {
    /// Normalise a user-supplied level, falling back to the default.
    pub fn parse_level(value: &str) -> String {
        match value.trim().to_lowercase().as_str() {
            "trace" => "trace".to_string(),
            "debug" => "debug".to_string(),
            "info" => "info".to_string(),
            "warn" | "warning" => "warn".to_string(),
            "error" => "error".to_string(),
            "off" | "none" | "quiet" => "off".to_string(),
            _ => DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Level for a `-v` count: 0 keeps the configured level.
    pub fn with_verbosity(mut self, verbose: u8) -> Self {
        match verbose {
            0 => {}
            1 => self.level = "debug".to_string(),
            _ => self.level = "trace".to_string(),
        }
        self
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held until
/// the program exits.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, LogError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(LogConfig::parse_level(&config.level)));

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_timer(LocalTime::rfc_3339());

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| LogError::CreateDirectory {
                path: dir.clone(),
                source: e,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(LocalTime::rfc_3339());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LogError::Init(e.to_string()))?;

    Ok(guard)
}
