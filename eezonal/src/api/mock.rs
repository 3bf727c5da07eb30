//! Scripted HTTP client for tests.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde_json::Value;

use super::{ApiError, HttpClient};

/// A request captured by [`MockHttpClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub url: String,
    pub bearer_token: String,
    pub body: Value,
}

/// Mock HTTP client that replays queued responses in order and records
/// every request it receives.
///
/// When the queue runs dry it answers with an empty JSON object.
#[derive(Debug, Default)]
pub struct MockHttpClient {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn respond(self, response: Result<Value, ApiError>) -> Self {
        self.responses.lock().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

impl HttpClient for MockHttpClient {
    fn post_json(&self, url: &str, bearer_token: &str, body: &Value) -> Result<Value, ApiError> {
        self.requests.lock().push(RecordedRequest {
            url: url.to_string(),
            bearer_token: bearer_token.to_string(),
            body: body.clone(),
        });
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(Value::Object(Default::default())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mock_replays_in_order() {
        let mock = MockHttpClient::new()
            .respond(Ok(json!({"a": 1})))
            .respond(Err(ApiError::Http("Test error".to_string())));

        assert_eq!(mock.post_json("u1", "t", &json!({})).unwrap(), json!({"a": 1}));
        assert!(mock.post_json("u2", "t", &json!({})).is_err());
        assert_eq!(mock.post_json("u3", "t", &json!({})).unwrap(), json!({}));

        let urls: Vec<String> = mock.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["u1", "u2", "u3"]);
    }
}
