//! Error type for remote service calls.

use thiserror::Error;

/// Errors that can occur while talking to the Earth Engine REST API.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, TLS, body read)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The service answered with a non-success status
    #[error("Service returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not the JSON we expected
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request body could not be serialized
    #[error("Failed to encode request: {0}")]
    Encode(String),

    /// A successful response lacked a required field
    #[error("Response is missing field '{0}'")]
    MissingField(&'static str),

    /// No access token was configured
    #[error("No access token configured (set EE_ACCESS_TOKEN or earthengine.access_token)")]
    MissingToken,
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Encode(e.to_string())
    }
}
