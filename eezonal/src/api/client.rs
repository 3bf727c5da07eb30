//! Earth Engine REST client.
//!
//! Three endpoints are used, all under `{base}/v1/projects/{project}`:
//!
//! - `value:compute` evaluates an expression graph and returns its value
//! - `table:export` starts a table export and returns the operation name
//! - `maps` registers a visualized image and returns a map name used in
//!   the tile URL template `{base}/v1/{name}/tiles/{z}/{x}/{y}`

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::export::ExportTask;
use crate::expr::{Expr, Image};
use crate::viz::VisParams;

use super::{ApiError, HttpClient};

/// Public Earth Engine API endpoint.
pub const DEFAULT_API_URL: &str = "https://earthengine.googleapis.com";

/// A registered map layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MapLayer {
    /// Service-assigned map resource name.
    pub name: String,
    /// XYZ tile URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
}

/// Client for the Earth Engine REST API.
///
/// # Example
///
/// ```no_run
/// use eezonal::api::{EarthEngine, ReqwestClient};
/// use eezonal::expr::Image;
///
/// let http = ReqwestClient::new().unwrap();
/// let ee = EarthEngine::new(http, "my-project", "ya29.token");
/// let value = ee.compute(Image::constant(1.0).expr()).unwrap();
/// ```
pub struct EarthEngine<C: HttpClient> {
    http_client: C,
    api_url: String,
    project: String,
    access_token: String,
}

impl<C: HttpClient> EarthEngine<C> {
    pub fn new(http_client: C, project: &str, access_token: &str) -> Self {
        Self {
            http_client,
            api_url: DEFAULT_API_URL.to_string(),
            project: project.to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// Overrides the API base URL.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1/projects/{}/{}", self.api_url, self.project, method)
    }

    fn post(&self, url: &str, body: &Value) -> Result<Value, ApiError> {
        if self.access_token.is_empty() {
            return Err(ApiError::MissingToken);
        }
        debug!(url = %url, "POST");
        self.http_client.post_json(url, &self.access_token, body)
    }

    /// Evaluates an expression and returns the computed value.
    pub fn compute(&self, expr: &Expr) -> Result<Value, ApiError> {
        let body = compute_request(expr);
        let mut response = self.post(&self.endpoint("value:compute"), &body)?;
        match response.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(ApiError::MissingField("result")),
        }
    }

    /// Starts a table export and returns the operation name.
    ///
    /// The task is not polled; its progress is only visible in the
    /// service's task list.
    pub fn start_table_export(&self, task: &ExportTask) -> Result<String, ApiError> {
        let body = task.to_request()?;
        let response = self.post(&self.endpoint("table:export"), &body)?;
        let operation = response
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ApiError::MissingField("name"))?
            .to_string();
        info!(
            description = %task.description,
            operation = %operation,
            "Export started"
        );
        Ok(operation)
    }

    /// Registers a visualized image and returns its tile layer.
    pub fn create_map(&self, image: &Image, vis: &VisParams) -> Result<MapLayer, ApiError> {
        let body = map_request(image, vis);
        let response = self.post(&self.endpoint("maps"), &body)?;
        let name = response
            .get("name")
            .and_then(Value::as_str)
            .ok_or(ApiError::MissingField("name"))?;
        Ok(MapLayer {
            name: name.to_string(),
            tile_url: format!("{}/v1/{}/tiles/{{z}}/{{x}}/{{y}}", self.api_url, name),
        })
    }
}

/// Request body for `value:compute`.
pub fn compute_request(expr: &Expr) -> Value {
    json!({ "expression": expr.to_graph() })
}

/// Request body for `maps`: the image restricted to the visualized bands
/// plus the visualization options.
pub fn map_request(image: &Image, vis: &VisParams) -> Value {
    let bands: Vec<&str> = vis.bands.iter().map(String::as_str).collect();
    json!({
        "expression": image.select(&bands).expr().to_graph(),
        "fileFormat": "AUTO_JPEG_PNG",
        "visualizationOptions": vis.to_options(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockHttpClient;
    use crate::expr::FeatureCollection;
    use crate::export::FileFormat;

    fn client(mock: MockHttpClient) -> EarthEngine<MockHttpClient> {
        EarthEngine::new(mock, "demo", "token").with_api_url("https://ee.test/")
    }

    fn task() -> ExportTask {
        ExportTask {
            description: "prison_canopy_AK".to_string(),
            collection: FeatureCollection::load("projects/demo/assets/sites"),
            format: FileFormat::Csv,
            folder: None,
            selectors: None,
        }
    }

    #[test]
    fn test_compute_returns_result() {
        let ee = client(MockHttpClient::new().respond(Ok(json!({"result": 42}))));
        let value = ee.compute(Image::constant(42.0).expr()).unwrap();
        assert_eq!(value, json!(42));

        let requests = ee.http_client.requests();
        assert_eq!(requests[0].url, "https://ee.test/v1/projects/demo/value:compute");
        assert_eq!(requests[0].bearer_token, "token");
        assert!(requests[0].body["expression"]["values"].is_object());
    }

    #[test]
    fn test_compute_missing_result() {
        let ee = client(MockHttpClient::new().respond(Ok(json!({}))));
        assert_eq!(
            ee.compute(Image::constant(1.0).expr()),
            Err(ApiError::MissingField("result"))
        );
    }

    #[test]
    fn test_http_status_error_propagates() {
        let ee = client(MockHttpClient::new().respond(Err(ApiError::Status {
            status: 401,
            message: "Request had invalid authentication credentials.".to_string(),
        })));
        let err = ee.start_table_export(&task()).unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 401, .. }));
    }

    #[test]
    fn test_start_export_returns_operation() {
        let ee = client(MockHttpClient::new().respond(Ok(json!({
            "name": "projects/demo/operations/ABC123",
            "metadata": {"state": "PENDING"}
        }))));
        let operation = ee.start_table_export(&task()).unwrap();
        assert_eq!(operation, "projects/demo/operations/ABC123");

        let request = &ee.http_client.requests()[0];
        assert_eq!(request.url, "https://ee.test/v1/projects/demo/table:export");
        assert_eq!(request.body["description"], "prison_canopy_AK");
    }

    #[test]
    fn test_missing_token_short_circuits() {
        let ee = EarthEngine::new(MockHttpClient::new(), "demo", "");
        assert_eq!(
            ee.compute(Image::constant(1.0).expr()),
            Err(ApiError::MissingToken)
        );
        assert!(ee.http_client.requests().is_empty());
    }

    #[test]
    fn test_create_map_builds_tile_url() {
        let ee = client(
            MockHttpClient::new().respond(Ok(json!({"name": "projects/demo/maps/xyz"}))),
        );
        let vis = VisParams::rgb(&["B4", "B3", "B2"], 0.0, 0.3);
        let layer = ee.create_map(&Image::load("COPERNICUS/S2/x"), &vis).unwrap();
        assert_eq!(
            layer.tile_url,
            "https://ee.test/v1/projects/demo/maps/xyz/tiles/{z}/{x}/{y}"
        );

        let body = &ee.http_client.requests()[0].body;
        assert_eq!(body["fileFormat"], "AUTO_JPEG_PNG");
        assert!(body.to_string().contains("Image.select"));
    }
}
