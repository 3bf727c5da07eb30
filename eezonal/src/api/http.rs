//! HTTP client abstraction for testability

use std::time::Duration;

use serde_json::Value;

use super::ApiError;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Trait for the JSON-over-HTTP calls the service client makes.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an authenticated HTTP POST with a JSON body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `bearer_token` - OAuth access token sent as `Authorization: Bearer`
    /// * `body` - JSON request body
    ///
    /// # Returns
    ///
    /// The decoded JSON response or an error.
    fn post_json(&self, url: &str, bearer_token: &str, body: &Value) -> Result<Value, ApiError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, ApiError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new ReqwestClient with custom timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ApiError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("eezonal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn post_json(&self, url: &str, bearer_token: &str, body: &Value) -> Result<Value, ApiError> {
        let payload = serde_json::to_vec(body).map_err(|e| ApiError::Encode(e.to_string()))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(bearer_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .map_err(|e| ApiError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .map_err(|e| ApiError::Http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&bytes),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Extracts `error.message` from a service error body, else the raw text.
pub(crate) fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_from_service_body() {
        let body = br#"{"error": {"code": 400, "message": "Collection.loadTable: not found", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(body), "Collection.loadTable: not found");
    }

    #[test]
    fn test_error_message_falls_back_to_text() {
        assert_eq!(error_message(b"  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn test_client_builds() {
        assert!(ReqwestClient::with_timeout(5).is_ok());
    }
}
