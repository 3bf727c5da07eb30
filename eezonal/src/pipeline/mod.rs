//! Zonal-statistics pipelines.
//!
//! Every facility pipeline follows the same four steps:
//!
//! ```text
//! Dataset selector ──► per-image transforms ──► zonal reducer ──► result shaper ──► export
//!  (collection,         (unit conversion,        (mean over         (rename, attach
//!   date window)         QA bit masks)            buffered zones)     date, drop nulls)
//! ```
//!
//! [`PipelineSpec`] captures the parameters that distinguish one pipeline
//! from another; [`presets`] holds the canopy and LST definitions. A spec
//! can build remote export tasks or run against in-memory rasters.

pub mod presets;
mod shape;
mod spec;
mod zonal;

pub use shape::{write_csv, OutputSchema, Record};
pub use spec::{DateWindow, Partition, PipelineSpec, PipelineSpecBuilder, TIME_START_PROPERTY};
pub use zonal::{ReductionShape, ZonalReduction, ZonalRow, INDEX_PROPERTY, MEAN_PROPERTY};

use thiserror::Error;

use crate::expr::PredicateError;
use crate::local::RasterError;

/// Errors building or evaluating a pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required builder field was never set.
    #[error("Pipeline '{pipeline}' is missing {field}")]
    Incomplete {
        pipeline: String,
        field: &'static str,
    },

    #[error("Unknown pipeline '{0}'")]
    UnknownPipeline(String),

    /// A per-feature partition does not name the image it reduces.
    #[error("Partition '{0}' has no image index")]
    MissingImageIndex(String),

    #[error("Invalid facility filter: {0}")]
    Predicate(#[from] PredicateError),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(String),
}
