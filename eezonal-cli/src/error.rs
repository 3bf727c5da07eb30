//! CLI error type.

use std::fmt;

use eezonal::api::ApiError;
use eezonal::config::ConfigError;
use eezonal::pipeline::PipelineError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Missing or invalid configuration
    Config(String),
    /// Remote service failure
    Api(ApiError),
    /// Pipeline definition or evaluation failure
    Pipeline(PipelineError),
    /// Output could not be serialized or written
    Output(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Api(e) => write!(f, "Earth Engine error: {}", e),
            CliError::Pipeline(e) => write!(f, "Pipeline error: {}", e),
            CliError::Output(msg) => write!(f, "Output error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ApiError> for CliError {
    fn from(e: ApiError) -> Self {
        CliError::Api(e)
    }
}

impl From<PipelineError> for CliError {
    fn from(e: PipelineError) -> Self {
        CliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Output(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = CliError::from(ApiError::Status {
            status: 403,
            message: "Caller does not have permission".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Earth Engine error: Service returned status 403: Caller does not have permission"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = CliError::from(ConfigError::UnknownKey("export.format".to_string()));
        assert_eq!(
            err.to_string(),
            "Configuration error: Unknown configuration key 'export.format'"
        );
    }
}
