//! Configuration file support
//!
//! Settings live in `<config dir>/eezonal/config.ini` (for example
//! `~/.config/eezonal/config.ini` on Linux). CLI flags override file values,
//! and the `EE_ACCESS_TOKEN` / `EE_PROJECT` environment variables override
//! both the file and the defaults.

mod file;
mod keys;

use std::path::PathBuf;

use thiserror::Error;

pub use file::{
    AssetSettings, ConfigFile, EarthEngineSettings, ExportSettings, LoggingSettings,
    ACCESS_TOKEN_ENV, PROJECT_ENV,
};
pub use keys::ConfigKey;

/// Errors from loading, saving or editing the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("Config file I/O error: {0}")]
    Io(String),

    /// The file is not valid INI
    #[error("Failed to parse config file: {0}")]
    Parse(String),

    /// A value failed validation
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// No such `section.key`
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),
}

/// Directory holding the config file.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("eezonal")
}

/// Full path of the config file.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path_name() {
        let path = config_file_path();
        assert!(path.ends_with("eezonal/config.ini"));
    }
}
