//! INI-backed configuration file.
//!
//! ```ini
//! [earthengine]
//! project = my-cloud-project
//! access_token =
//! api_url = https://earthengine.googleapis.com
//! timeout = 60
//!
//! [assets]
//! facilities =
//! facilities_night =
//!
//! [export]
//! folder =
//!
//! [logging]
//! level = info
//! directory =
//! ```
//!
//! Empty values mean "not set"; the asset keys then fall back to each
//! pipeline's own facility table. `EE_ACCESS_TOKEN` and `EE_PROJECT` override
//! the file when present in the environment.

use std::path::{Path, PathBuf};

use ini::Ini;
use tracing::debug;

use crate::api::{DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS};

use super::{config_file_path, ConfigError};

/// Environment variable holding an OAuth access token.
pub const ACCESS_TOKEN_ENV: &str = "EE_ACCESS_TOKEN";

/// Environment variable holding the Cloud project id.
pub const PROJECT_ENV: &str = "EE_PROJECT";

#[derive(Debug, Clone, PartialEq)]
pub struct EarthEngineSettings {
    pub project: Option<String>,
    pub access_token: Option<String>,
    pub api_url: String,
    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for EarthEngineSettings {
    fn default() -> Self {
        Self {
            project: None,
            access_token: None,
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Facility asset overrides; `None` keeps the pipeline's own asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetSettings {
    /// Replaces the canopy and daytime LST facility table.
    pub facilities: Option<String>,
    /// Replaces the night-time LST facility table.
    pub facilities_night: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSettings {
    /// Drive folder overriding each pipeline's default.
    pub folder: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl LoggingSettings {
    /// Configured directory, else `<data dir>/eezonal/logs`.
    pub fn resolved_directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("eezonal")
                .join("logs")
        })
    }
}

/// All persisted settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub earthengine: EarthEngineSettings,
    pub assets: AssetSettings,
    pub export: ExportSettings,
    pub logging: LoggingSettings,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ConfigFile {
    /// Loads the user's config file, falling back to defaults when it does
    /// not exist, then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        let config = if path.exists() {
            Self::load_from(&path)?
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };
        Ok(config.with_env_overrides(|name| std::env::var(name).ok()))
    }

    /// Loads settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_ini(&ini)
    }

    /// Parses settings from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let get = |section: &str, key: &str| ini.section(Some(section)).and_then(|s| s.get(key));

        config.earthengine.project = non_empty(get("earthengine", "project"));
        config.earthengine.access_token = non_empty(get("earthengine", "access_token"));
        if let Some(url) = non_empty(get("earthengine", "api_url")) {
            config.earthengine.api_url = url;
        }
        if let Some(timeout) = non_empty(get("earthengine", "timeout")) {
            config.earthengine.timeout = parse_timeout(&timeout)?;
        }

        config.assets.facilities = non_empty(get("assets", "facilities"));
        config.assets.facilities_night = non_empty(get("assets", "facilities_night"));

        config.export.folder = non_empty(get("export", "folder"));

        if let Some(level) = non_empty(get("logging", "level")) {
            config.logging.level = level;
        }
        config.logging.directory = non_empty(get("logging", "directory")).map(PathBuf::from);

        Ok(config)
    }

    /// Applies `EE_ACCESS_TOKEN` and `EE_PROJECT` from `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(token) = non_empty(lookup(ACCESS_TOKEN_ENV).as_deref()) {
            self.earthengine.access_token = Some(token);
        }
        if let Some(project) = non_empty(lookup(PROJECT_ENV).as_deref()) {
            self.earthengine.project = Some(project);
        }
        self
    }

    /// Writes the user's config file, creating its directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::Io(format!("{}: {}", parent.display(), e)))?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))
    }

    fn to_ini(&self) -> Ini {
        let opt = |v: &Option<String>| v.clone().unwrap_or_default();
        let mut ini = Ini::new();
        ini.with_section(Some("earthengine"))
            .set("project", opt(&self.earthengine.project))
            .set("access_token", opt(&self.earthengine.access_token))
            .set("api_url", self.earthengine.api_url.as_str())
            .set("timeout", self.earthengine.timeout.to_string());
        ini.with_section(Some("assets"))
            .set("facilities", opt(&self.assets.facilities))
            .set("facilities_night", opt(&self.assets.facilities_night));
        ini.with_section(Some("export"))
            .set("folder", opt(&self.export.folder));
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            );
        ini
    }
}

pub(crate) fn parse_timeout(value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            key: "earthengine.timeout".to_string(),
            value: value.to_string(),
            reason: "expected a positive number of seconds".to_string(),
        }),
    }
}
