//! Rothfusz heat-index regression as an image transform.

use crate::expr::Image;
use crate::local::{Band, LocalImage, RasterError};

use super::ImageTransform;

const C1: f64 = -42.379;
const C2: f64 = 2.049_015_23;
const C3: f64 = 10.143_331_27;
const C4: f64 = -0.224_755_41;
const C5: f64 = -6.837_83e-3;
const C6: f64 = -5.481_717e-2;
const C7: f64 = 1.228_74e-3;
const C8: f64 = 8.528_2e-4;
const C9: f64 = -1.99e-6;

/// Heat index from temperature `t` and relative humidity `h`.
pub fn heat_index(t: f64, h: f64) -> f64 {
    let (t2, h2) = (t * t, h * h);
    C1 + C2 * t
        + C3 * h
        + C4 * t * h
        + C5 * t2
        + C6 * h2
        + C7 * t2 * h
        + C8 * t * h2
        + C9 * t2 * h2
}

/// Adds a `heat_index` band computed from two input bands.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatIndex {
    temperature_band: String,
    humidity_band: String,
}

impl HeatIndex {
    pub const OUTPUT_BAND: &'static str = "heat_index";

    pub fn new(temperature_band: &str, humidity_band: &str) -> Self {
        Self {
            temperature_band: temperature_band.to_string(),
            humidity_band: humidity_band.to_string(),
        }
    }

    /// Landsat 8 thermal band B11 with the B9 band as the humidity input.
    pub fn landsat8() -> Self {
        Self::new("B11", "B9")
    }
}

impl ImageTransform for HeatIndex {
    fn name(&self) -> &str {
        "heat_index"
    }

    fn apply(&self, image: &Image) -> Image {
        let t = image.select(&[self.temperature_band.as_str()]);
        let h = image.select(&[self.humidity_band.as_str()]);
        let t2 = t.pow(2.0);
        let h2 = h.pow(2.0);

        let terms = [
            t.multiply(C2),
            h.multiply(C3),
            t.multiply_image(&h).multiply(C4),
            t2.multiply(C5),
            h2.multiply(C6),
            t2.multiply_image(&h).multiply(C7),
            t.multiply_image(&h2).multiply(C8),
            t2.multiply_image(&h2).multiply(C9),
        ];
        let index = terms
            .iter()
            .fold(Image::constant(C1), |acc, term| acc.add_image(term))
            .rename(&[Self::OUTPUT_BAND]);

        image.add_bands(&index, None, false)
    }

    fn apply_local(&self, image: &LocalImage) -> Result<LocalImage, RasterError> {
        let t = image.band(&self.temperature_band)?;
        let h = image.band(&self.humidity_band)?;

        let band = Band {
            values: t
                .values
                .iter()
                .zip(&h.values)
                .map(|(t, h)| heat_index(*t, *h))
                .collect(),
            valid: t.valid.iter().zip(&h.valid).map(|(a, b)| *a && *b).collect(),
        };

        let mut out = image.clone();
        out.insert_band(Self::OUTPUT_BAND, band)?;
        Ok(out)
    }
}
