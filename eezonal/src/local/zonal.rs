//! Zonal mean over facility footprints.

use std::collections::BTreeMap;

use geo::{Coord, Distance, Euclidean, Point, Polygon, Rect};
use serde_json::Value;

use super::{Band, Grid};

/// A facility footprint, optionally buffered outward.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    polygon: Polygon<f64>,
    buffer: f64,
}

impl Zone {
    pub fn new(polygon: Polygon<f64>) -> Self {
        Self {
            polygon,
            buffer: 0.0,
        }
    }

    /// Axis-aligned rectangle zone in grid coordinates.
    pub fn rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        let rect = Rect::new(Coord { x: min_x, y: min_y }, Coord { x: max_x, y: max_y });
        Self::new(rect.to_polygon())
    }

    /// Returns the zone grown by `distance` (same unit as the grid).
    pub fn buffered(&self, distance: f64) -> Self {
        Self {
            polygon: self.polygon.clone(),
            buffer: self.buffer + distance.max(0.0),
        }
    }

    /// True when the point lies inside the polygon or within the buffer
    /// distance of its boundary (boundary points count as inside).
    pub fn covers(&self, x: f64, y: f64) -> bool {
        Euclidean.distance(&Point::new(x, y), &self.polygon) <= self.buffer
    }
}

/// A facility with its scalar properties and footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub id: String,
    pub properties: BTreeMap<String, Value>,
    pub zone: Zone,
}

impl Facility {
    pub fn new(id: &str, zone: Zone) -> Self {
        Self {
            id: id.to_string(),
            properties: BTreeMap::new(),
            zone,
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }
}

/// Mean of valid pixels whose centre the zone covers.
///
/// Returns `None` when no valid pixel falls inside the zone, which is how a
/// fully masked or cloud-obscured footprint shows up.
pub fn zonal_mean(band: &Band, grid: &Grid, zone: &Zone) -> Option<f64> {
    let (sum, count) = band
        .values
        .iter()
        .zip(&band.valid)
        .enumerate()
        .filter(|(_, (_, valid))| **valid)
        .filter(|(i, _)| {
            let (x, y) = grid.pixel_center(*i);
            zone.covers(x, y)
        })
        .fold((0.0, 0usize), |(sum, count), (_, (v, _))| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
