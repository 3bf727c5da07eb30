//! Linear scale/offset conversion of selected bands.

use crate::expr::Image;
use crate::local::{LocalImage, RasterError};

use super::ImageTransform;

/// MODIS LST digital number to Kelvin.
pub const MODIS_LST_SCALE: f64 = 0.02;

/// Kelvin to degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Raw MODIS LST value to degrees Celsius.
#[inline]
pub fn to_celsius(raw: f64) -> f64 {
    raw * MODIS_LST_SCALE - KELVIN_OFFSET
}

/// `y = x * scale + offset` on every band matching `selector`.
///
/// Matching bands are overwritten in place; other bands and all metadata are
/// left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleOffset {
    name: String,
    selector: String,
    scale: f64,
    offset: f64,
    /// Pass explicit band names to `addBands` (single literal band only).
    named: bool,
}

impl ScaleOffset {
    /// `selector` is a band name or a regular expression over band names.
    pub fn new(name: &str, selector: &str, scale: f64, offset: f64) -> Self {
        Self {
            name: name.to_string(),
            selector: selector.to_string(),
            scale,
            offset,
            named: false,
        }
    }

    /// MODIS LST band to degrees Celsius.
    pub fn modis_lst_celsius(band: &str) -> Self {
        Self {
            named: true,
            ..Self::new("to_celsius", band, MODIS_LST_SCALE, -KELVIN_OFFSET)
        }
    }

    /// Landsat Collection 2 Level 2 surface reflectance bands.
    pub fn landsat_optical() -> Self {
        Self::new("landsat_sr_scale", "SR_B.", 0.0000275, -0.2)
    }

    /// Landsat Collection 2 Level 2 surface temperature bands (Kelvin).
    pub fn landsat_thermal() -> Self {
        Self::new("landsat_st_scale", "ST_B.*", 0.00341802, 149.0)
    }

    /// Sentinel-2 L2A digital numbers to reflectance.
    pub fn sentinel2_reflectance() -> Self {
        Self::new("sentinel2_reflectance", ".*", 1.0 / 10000.0, 0.0)
    }

    pub fn convert(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }
}

impl ImageTransform for ScaleOffset {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, image: &Image) -> Image {
        let mut converted = image.select(&[self.selector.as_str()]);
        if self.scale != 1.0 {
            converted = converted.multiply(self.scale);
        }
        if self.offset < 0.0 {
            converted = converted.subtract(-self.offset);
        } else if self.offset > 0.0 {
            converted = converted.add(self.offset);
        }

        let band_names = [self.selector.as_str()];
        image.add_bands(&converted, self.named.then_some(&band_names[..]), true)
    }

    fn apply_local(&self, image: &LocalImage) -> Result<LocalImage, RasterError> {
        let mut out = image.clone();
        for name in image.matching_bands(&self.selector)? {
            let converted = image.band(&name)?.map(|v| self.convert(v));
            out.insert_band(&name, converted)?;
        }
        Ok(out)
    }
}
