//! Earth Engine REST API access
//!
//! [`EarthEngine`] sends expression graphs to the service over any
//! [`HttpClient`]. Production code uses [`ReqwestClient`]; tests inject
//! [`MockHttpClient`] to script responses and inspect request bodies.

mod client;
mod error;
mod http;
mod mock;

pub use client::{compute_request, map_request, EarthEngine, MapLayer, DEFAULT_API_URL};
pub use error::ApiError;
pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use mock::{MockHttpClient, RecordedRequest};
