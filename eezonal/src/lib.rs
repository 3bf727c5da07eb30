//! eezonal - Earth Engine zonal statistics for facility footprints
//!
//! Builds declarative Earth Engine request graphs that compute the mean of a
//! raster band (tree canopy cover, daily land surface temperature) around
//! each facility polygon, and starts table exports of the results. A small
//! imagery viewer picks the observation nearest to a date and renders it
//! as map layers.
//!
//! # Modules
//!
//! - [`expr`] - expression graph builders and JSON encoding
//! - [`transform`] - per-image transforms (scale/offset, QA bit masks, heat index)
//! - [`pipeline`] - pipeline specs, zonal reduction, result shaping, presets
//! - [`export`] - table export tasks
//! - [`api`] - Earth Engine REST client over a pluggable HTTP client
//! - [`viz`] - visualization layers and the nearest-date viewer
//! - [`local`] - in-memory evaluator used to check pipelines on small rasters
//! - [`config`] - INI configuration file
//! - [`logging`] - tracing subscriber setup

pub mod api;
pub mod config;
pub mod export;
pub mod expr;
pub mod local;
pub mod logging;
pub mod pipeline;
pub mod transform;
pub mod viz;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
