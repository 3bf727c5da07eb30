//! Imagery visualization.
//!
//! - [`layer`] - mode/sensor table of bands, stretches and preprocessing
//! - [`catalog`] - merged Sentinel-2 and Landsat catalog, nearest-date pick
//! - [`viewer`] - nearest observation to a date rendered as map layers
//! - [`heat`] - heat-index composite layer

pub mod catalog;
pub mod heat;
pub mod layer;
pub mod viewer;

pub use catalog::{nearest_index, nearest_observation, observation_catalog, study_region};
pub use heat::{heat_index_image, heat_index_vis};
pub use layer::{reference_layer, select_layer, LayerRecipe, Sensor, VisMode, VisParams};
pub use viewer::{view, Observation, View};
