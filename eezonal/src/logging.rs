//! Logging setup.
//!
//! Log output goes to stderr and to a daily-rolling file. The level comes
//! from `RUST_LOG` when set, else from the configured level.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let _guard = eezonal::logging::init_logging("info", Path::new("/tmp/eezonal-logs")).unwrap();
//! tracing::info!(pipeline = "canopy", "Starting export");
//! ```

use std::path::Path;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use tracing_appender::non_blocking::WorkerGuard;

/// File name prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "eezonal.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created
    #[error("Failed to create log directory {path}: {message}")]
    Directory { path: String, message: String },

    /// A global subscriber is already installed
    #[error("Logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Builds the filter: `RUST_LOG` if set and valid, else `default_level`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop; hold it for the life
/// of the process.
pub fn init_logging(default_level: &str, directory: &Path) -> Result<WorkerGuard, LoggingError> {
    std::fs::create_dir_all(directory).map_err(|e| LoggingError::Directory {
        path: directory.display().to_string(),
        message: e.to_string(),
    })?;

    let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer),
        )
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_env_filter_falls_back_to_level() {
        // Only checks construction; the global subscriber can be set once per process.
        let filter = env_filter("debug");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_init_creates_directory() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let result = init_logging("info", &logs);
        assert!(logs.is_dir());
        // A second init in the same process must fail rather than panic.
        if result.is_ok() {
            assert!(matches!(
                init_logging("info", &logs),
                Err(LoggingError::AlreadyInitialized(_))
            ));
        }
    }
}
