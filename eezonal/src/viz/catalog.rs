//! Merged optical observation catalog and nearest-date selection.

use crate::expr::number::abs_difference;
use crate::expr::{Geometry, Image, ImageCollection};
use crate::pipeline::TIME_START_PROPERTY;
use crate::transform::{ScaleOffset, TransformChain};

use super::layer::{SENTINEL2_SPACECRAFT, SPACECRAFT_PROPERTY};

/// Study area `(west, south, east, north)` around the Poudre watershed.
pub const STUDY_REGION: [f64; 4] = [-105.89218, 40.417183, -105.140642, 40.72316];

pub const SENTINEL2_SR: &str = "COPERNICUS/S2_SR_HARMONIZED";
pub const LANDSAT8_L2: &str = "LANDSAT/LC08/C02/T1_L2";
pub const LANDSAT9_L2: &str = "LANDSAT/LC09/C02/T1_L2";

/// Per-image distance to the requested date, used as the sort key.
pub const DATE_DISTANCE_PROPERTY: &str = "dateDist";

pub fn study_region() -> Geometry {
    let [west, south, east, north] = STUDY_REGION;
    Geometry::bbox(west, south, east, north)
}

fn landsat_scale_factors() -> TransformChain {
    TransformChain::new()
        .then(ScaleOffset::landsat_optical())
        .then(ScaleOffset::landsat_thermal())
}

/// Sentinel-2, Landsat 8 and Landsat 9 scenes over `region`, merged.
///
/// Sentinel-2 images are tagged with a `SPACECRAFT_ID` so every image in
/// the merged collection carries one. Landsat images get their Collection 2
/// scale factors applied.
pub fn observation_catalog(region: &Geometry) -> ImageCollection {
    let sentinel = ImageCollection::load(SENTINEL2_SR)
        .filter_bounds(region)
        .map(|img| img.set(SPACECRAFT_PROPERTY, SENTINEL2_SPACECRAFT));

    let landsat = |id: &str| {
        let scale = landsat_scale_factors();
        ImageCollection::load(id)
            .filter_bounds(region)
            .map(move |img| scale.apply(&img))
    };

    sentinel.merge(&landsat(LANDSAT8_L2)).merge(&landsat(LANDSAT9_L2))
}

/// The catalog image whose acquisition time is closest to `target_millis`.
pub fn nearest_observation(catalog: &ImageCollection, target_millis: i64) -> Image {
    catalog
        .map(|img| {
            let distance = abs_difference(img.get(TIME_START_PROPERTY), target_millis);
            img.set(DATE_DISTANCE_PROPERTY, distance)
        })
        .sort(DATE_DISTANCE_PROPERTY, true)
        .first()
}

/// Index of the timestamp closest to `target`, first one on ties.
///
/// Returns `None` for an empty slice.
pub fn nearest_index(timestamps: &[i64], target: i64) -> Option<usize> {
    let mut best: Option<(usize, u64)> = None;
    for (i, t) in timestamps.iter().enumerate() {
        let distance = t.abs_diff(target);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}
