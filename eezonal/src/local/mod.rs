//! In-memory raster evaluation.
//!
//! A small local counterpart of the remote image model: a georeferenced grid,
//! named bands with per-pixel validity, and metadata properties. Transforms
//! and the zonal reducer evaluate against it with the same semantics the
//! remote graph encodes, which keeps the pipelines testable offline.

mod zonal;

pub use zonal::{zonal_mean, Facility, Zone};

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Errors raised by local evaluation.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Band '{0}' not found")]
    MissingBand(String),

    #[error("Band '{band}' has {actual} pixels, grid expects {expected}")]
    SizeMismatch {
        band: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid band selector '{selector}': {source}")]
    InvalidSelector {
        selector: String,
        #[source]
        source: regex::Error,
    },
}

/// Pixel grid in a projected coordinate system (metres), north-up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub width: usize,
    pub height: usize,
    /// X of the upper-left corner.
    pub origin_x: f64,
    /// Y of the upper-left corner.
    pub origin_y: f64,
    /// Pixel edge length.
    pub pixel_size: f64,
}

impl Grid {
    pub fn new(width: usize, height: usize, origin_x: f64, origin_y: f64, pixel_size: f64) -> Self {
        Self {
            width,
            height,
            origin_x,
            origin_y,
            pixel_size,
        }
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Centre of the pixel at `index` (row-major).
    pub fn pixel_center(&self, index: usize) -> (f64, f64) {
        let col = index % self.width;
        let row = index / self.width;
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_size,
            self.origin_y - (row as f64 + 0.5) * self.pixel_size,
        )
    }
}

/// One band: values plus a validity flag per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub values: Vec<f64>,
    pub valid: Vec<bool>,
}

impl Band {
    /// A band with every pixel valid.
    pub fn new(values: Vec<f64>) -> Self {
        let valid = vec![true; values.len()];
        Self { values, valid }
    }

    /// Applies `f` to every value, keeping validity.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Band {
        Band {
            values: self.values.iter().map(|v| f(*v)).collect(),
            valid: self.valid.clone(),
        }
    }

    /// Invalidates pixels where `keep` is false. Validity only ever shrinks.
    pub fn mask_with(&mut self, keep: &[bool]) {
        for (valid, keep) in self.valid.iter_mut().zip(keep) {
            *valid &= *keep;
        }
    }

    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|v| **v).count()
    }
}

/// An image held in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalImage {
    pub grid: Grid,
    bands: BTreeMap<String, Band>,
    pub properties: BTreeMap<String, Value>,
}

impl LocalImage {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            bands: BTreeMap::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds or replaces a band; its length must match the grid.
    pub fn with_band(mut self, name: &str, band: Band) -> Result<Self, RasterError> {
        self.insert_band(name, band)?;
        Ok(self)
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn insert_band(&mut self, name: &str, band: Band) -> Result<(), RasterError> {
        if band.values.len() != self.grid.len() || band.valid.len() != self.grid.len() {
            return Err(RasterError::SizeMismatch {
                band: name.to_string(),
                expected: self.grid.len(),
                actual: band.values.len(),
            });
        }
        self.bands.insert(name.to_string(), band);
        Ok(())
    }

    pub fn band(&self, name: &str) -> Result<&Band, RasterError> {
        self.bands
            .get(name)
            .ok_or_else(|| RasterError::MissingBand(name.to_string()))
    }

    pub fn band_mut(&mut self, name: &str) -> Result<&mut Band, RasterError> {
        self.bands
            .get_mut(name)
            .ok_or_else(|| RasterError::MissingBand(name.to_string()))
    }

    pub fn band_names(&self) -> impl Iterator<Item = &str> {
        self.bands.keys().map(String::as_str)
    }

    /// Names of bands fully matching the regular expression `selector`.
    pub fn matching_bands(&self, selector: &str) -> Result<Vec<String>, RasterError> {
        let re = Regex::new(&format!("^(?:{})$", selector)).map_err(|source| {
            RasterError::InvalidSelector {
                selector: selector.to_string(),
                source,
            }
        })?;
        Ok(self
            .bands
            .keys()
            .filter(|name| re.is_match(name))
            .cloned()
            .collect())
    }

    /// Keeps only the named bands, in the grid and properties of `self`.
    pub fn select(&self, names: &[&str]) -> Result<LocalImage, RasterError> {
        let mut out = LocalImage {
            grid: self.grid,
            bands: BTreeMap::new(),
            properties: self.properties.clone(),
        };
        for name in names {
            out.bands.insert(name.to_string(), self.band(name)?.clone());
        }
        Ok(out)
    }

    /// Invalidates pixels in every band where `keep` is false.
    pub fn update_mask(&mut self, keep: &[bool]) {
        for band in self.bands.values_mut() {
            band.mask_with(keep);
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}
