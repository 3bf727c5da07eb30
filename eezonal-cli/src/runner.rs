//! Shared setup for commands that talk to the service.

use eezonal::api::{EarthEngine, ReqwestClient};
use eezonal::config::{ConfigFile, ACCESS_TOKEN_ENV, PROJECT_ENV};
use eezonal::logging::{init_logging, WorkerGuard};
use tracing::debug;

use crate::error::CliError;

/// Loaded configuration plus the logging guard for the command's lifetime.
pub struct CliRunner {
    config: ConfigFile,
    _log_guard: Option<WorkerGuard>,
}

impl CliRunner {
    /// Loads the config and installs logging.
    ///
    /// A log directory that cannot be created only disables logging.
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let log_dir = config.logging.resolved_directory();
        let log_guard = match init_logging(&config.logging.level, &log_dir) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Warning: logging disabled: {}", e);
                None
            }
        };
        debug!(log_dir = %log_dir.display(), "Logging initialized");

        Ok(Self {
            config,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Creates a service client from the configured project and token.
    pub fn earth_engine(&self) -> Result<EarthEngine<ReqwestClient>, CliError> {
        let settings = &self.config.earthengine;
        let project = settings.project.as_deref().ok_or_else(|| {
            CliError::Config(format!(
                "No Earth Engine project set. Run 'eezonal config set earthengine.project <id>' or set {}",
                PROJECT_ENV
            ))
        })?;
        let token = settings.access_token.as_deref().ok_or_else(|| {
            CliError::Config(format!(
                "No access token. Set {} (e.g. from 'gcloud auth print-access-token')",
                ACCESS_TOKEN_ENV
            ))
        })?;

        let http = ReqwestClient::with_timeout(settings.timeout)?;
        Ok(EarthEngine::new(http, project, token).with_api_url(&settings.api_url))
    }
}
