//! Addressable configuration keys for `config get|set|list`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::{parse_timeout, ConfigFile};
use super::ConfigError;

/// A `section.key` name in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    EarthEngineProject,
    EarthEngineAccessToken,
    EarthEngineApiUrl,
    EarthEngineTimeout,
    AssetsFacilities,
    AssetsFacilitiesNight,
    ExportFolder,
    LoggingLevel,
    LoggingDirectory,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::EarthEngineProject,
            ConfigKey::EarthEngineAccessToken,
            ConfigKey::EarthEngineApiUrl,
            ConfigKey::EarthEngineTimeout,
            ConfigKey::AssetsFacilities,
            ConfigKey::AssetsFacilitiesNight,
            ConfigKey::ExportFolder,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
        ]
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::EarthEngineProject => "earthengine.project",
            ConfigKey::EarthEngineAccessToken => "earthengine.access_token",
            ConfigKey::EarthEngineApiUrl => "earthengine.api_url",
            ConfigKey::EarthEngineTimeout => "earthengine.timeout",
            ConfigKey::AssetsFacilities => "assets.facilities",
            ConfigKey::AssetsFacilitiesNight => "assets.facilities_night",
            ConfigKey::ExportFolder => "export.folder",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingDirectory => "logging.directory",
        }
    }

    pub fn section(&self) -> &'static str {
        self.name().split_once('.').map_or("", |(s, _)| s)
    }

    pub fn key_name(&self) -> &'static str {
        self.name().split_once('.').map_or("", |(_, k)| k)
    }

    /// Whether the value should be hidden when listed.
    pub fn is_secret(&self) -> bool {
        matches!(self, ConfigKey::EarthEngineAccessToken)
    }

    /// Current value as a string; empty when not set.
    pub fn get(&self, config: &ConfigFile) -> String {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        match self {
            ConfigKey::EarthEngineProject => opt(&config.earthengine.project),
            ConfigKey::EarthEngineAccessToken => opt(&config.earthengine.access_token),
            ConfigKey::EarthEngineApiUrl => config.earthengine.api_url.clone(),
            ConfigKey::EarthEngineTimeout => config.earthengine.timeout.to_string(),
            ConfigKey::AssetsFacilities => opt(&config.assets.facilities),
            ConfigKey::AssetsFacilitiesNight => opt(&config.assets.facilities_night),
            ConfigKey::ExportFolder => opt(&config.export.folder),
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Validates and stores `value`. An empty value clears optional keys.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());

        match self {
            ConfigKey::EarthEngineProject => config.earthengine.project = optional(),
            ConfigKey::EarthEngineAccessToken => config.earthengine.access_token = optional(),
            ConfigKey::EarthEngineApiUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(self.invalid(value, "expected an http(s) URL"));
                }
                config.earthengine.api_url = value.trim_end_matches('/').to_string();
            }
            ConfigKey::EarthEngineTimeout => config.earthengine.timeout = parse_timeout(value)?,
            ConfigKey::AssetsFacilities => config.assets.facilities = optional(),
            ConfigKey::AssetsFacilitiesNight => config.assets.facilities_night = optional(),
            ConfigKey::ExportFolder => config.export.folder = optional(),
            ConfigKey::LoggingLevel => {
                let level = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&level.as_str()) {
                    return Err(self.invalid(value, "expected trace, debug, info, warn or error"));
                }
                config.logging.level = level;
            }
            ConfigKey::LoggingDirectory => config.logging.directory = optional().map(PathBuf::from),
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_and_split() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
            assert_eq!(format!("{}.{}", key.section(), key.key_name()), key.name());
        }
        assert!(matches!(
            "earthengine.region".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();
        ConfigKey::EarthEngineProject.set(&mut config, "heat-study").unwrap();
        ConfigKey::EarthEngineTimeout.set(&mut config, "30").unwrap();
        ConfigKey::LoggingLevel.set(&mut config, "DEBUG").unwrap();

        assert_eq!(ConfigKey::EarthEngineProject.get(&config), "heat-study");
        assert_eq!(config.earthengine.timeout, 30);
        assert_eq!(ConfigKey::LoggingLevel.get(&config), "debug");
    }

    #[test]
    fn test_empty_clears_optional_but_not_required() {
        let mut config = ConfigFile::default();
        ConfigKey::ExportFolder.set(&mut config, "gee_exports").unwrap();
        ConfigKey::ExportFolder.set(&mut config, "").unwrap();
        assert!(config.export.folder.is_none());

        ConfigKey::AssetsFacilities.set(&mut config, "projects/p/assets/sites").unwrap();
        ConfigKey::AssetsFacilities.set(&mut config, " ").unwrap();
        assert!(config.assets.facilities.is_none());

        assert!(ConfigKey::LoggingLevel.set(&mut config, " ").is_err());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = ConfigFile::default();
        assert!(ConfigKey::EarthEngineApiUrl.set(&mut config, "earthengine").is_err());
        assert!(ConfigKey::LoggingLevel.set(&mut config, "verbose").is_err());
        assert!(ConfigKey::EarthEngineTimeout.set(&mut config, "-1").is_err());
        assert!(ConfigKey::EarthEngineAccessToken.is_secret());
    }
}
