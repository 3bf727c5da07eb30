//! 2018 Landsat 8 heat-index composite over the conterminous US.

use crate::expr::{Geometry, Image, ImageCollection};
use crate::transform::{HeatIndex, ImageTransform};

use super::layer::VisParams;

/// Conterminous US `(west, south, east, north)`.
pub const CONUS_REGION: [f64; 4] = [-126.4, 24.5, -66.9, 49.1];

pub const LANDSAT8_SR: &str = "LANDSAT/LC08/C01/T1_SR";

const START: &str = "2018-01-01";
const END: &str = "2018-12-31";

/// Per-pixel median heat index of the 2018 scenes.
pub fn heat_index_image() -> Image {
    let [west, south, east, north] = CONUS_REGION;
    let region = Geometry::bbox(west, south, east, north);
    let heat = HeatIndex::landsat8();

    ImageCollection::load(LANDSAT8_SR)
        .filter_bounds(&region)
        .filter_date(START, END)
        .map(|img| heat.apply(&img))
        .median()
        .select(&[HeatIndex::OUTPUT_BAND])
}

/// Default greyscale stretch of the heat-index band.
pub fn heat_index_vis() -> VisParams {
    VisParams::gray(HeatIndex::OUTPUT_BAND, 0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heat_index_graph() {
        let graph = heat_index_image().expr().to_graph().to_string();
        for needle in [LANDSAT8_SR, "2018-01-01", "2018-12-31", "reduce.median", "B11", "B9", "heat_index"] {
            assert!(graph.contains(needle), "missing {}", needle);
        }
    }
}
