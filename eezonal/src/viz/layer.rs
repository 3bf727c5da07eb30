//! Visualization modes and per-sensor layer recipes.

use std::fmt;
use std::str::FromStr;

use serde_json::{json, Value};

use crate::expr::Image;
use crate::transform::{QaMask, ScaleOffset, TransformChain};

/// Property the Sentinel-2 images are tagged with to match Landsat metadata.
pub const SPACECRAFT_PROPERTY: &str = "SPACECRAFT_ID";

/// Spacecraft tag assigned to every Sentinel-2 image.
pub const SENTINEL2_SPACECRAFT: &str = "Sentinel-2A";

/// Band produced by a normalized difference.
pub const NORMALIZED_DIFFERENCE_BAND: &str = "nd";

const SNOW_PALETTE: [&str; 2] = ["green", "white"];

/// What the viewer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisMode {
    TrueColor,
    WildfireDamage,
    SnowProbability,
}

impl VisMode {
    pub const ALL: [VisMode; 3] = [
        VisMode::TrueColor,
        VisMode::WildfireDamage,
        VisMode::SnowProbability,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisMode::TrueColor => "true-color",
            VisMode::WildfireDamage => "wildfire-damage",
            VisMode::SnowProbability => "snow-probability",
        }
    }
}

impl fmt::Display for VisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisMode::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Unknown mode '{}'. Expected one of: true-color, wildfire-damage, snow-probability",
                    s
                )
            })
    }
}

/// Sensor family of an observation, as far as band naming is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Sentinel2,
    Landsat,
}

impl Sensor {
    /// Classifies a `SPACECRAFT_ID` value. Anything not tagged as
    /// Sentinel-2 is a Landsat scene.
    pub fn from_spacecraft(spacecraft: &str) -> Self {
        if spacecraft == SENTINEL2_SPACECRAFT {
            Sensor::Sentinel2
        } else {
            Sensor::Landsat
        }
    }
}

/// Display parameters of a map layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisParams {
    pub bands: Vec<String>,
    pub min: f64,
    pub max: f64,
    pub palette: Vec<String>,
}

impl VisParams {
    /// Three-band composite stretched over `[min, max]`.
    pub fn rgb(bands: &[&str], min: f64, max: f64) -> Self {
        Self {
            bands: bands.iter().map(|b| b.to_string()).collect(),
            min,
            max,
            palette: Vec::new(),
        }
    }

    /// Single band in greyscale over `[min, max]`.
    pub fn gray(band: &str, min: f64, max: f64) -> Self {
        Self::palette(band, min, max, &[])
    }

    /// Single band rendered through a colour palette.
    pub fn palette(band: &str, min: f64, max: f64, palette: &[&str]) -> Self {
        Self {
            bands: vec![band.to_string()],
            min,
            max,
            palette: palette.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// `visualizationOptions` object of a map request.
    pub fn to_options(&self) -> Value {
        let mut options = json!({
            "ranges": [{ "min": self.min, "max": self.max }],
        });
        if !self.palette.is_empty() {
            options["paletteColors"] = json!(self.palette);
        }
        options
    }
}

#[derive(Debug, Clone)]
enum Derivation {
    None,
    NormalizedDifference(&'static str, &'static str),
}

/// How to turn a raw observation into a displayable layer.
#[derive(Debug, Clone)]
pub struct LayerRecipe {
    pub sensor: Sensor,
    pub mode: VisMode,
    pub vis: VisParams,
    preprocess: TransformChain,
    derivation: Derivation,
}

impl LayerRecipe {
    /// Applies preprocessing and any derived band to `image`.
    pub fn render(&self, image: &Image) -> Image {
        let image = self.preprocess.apply(image);
        match self.derivation {
            Derivation::None => image,
            Derivation::NormalizedDifference(a, b) => image.normalized_difference(a, b),
        }
    }

    pub fn is_cloud_masked(&self) -> bool {
        !self.preprocess.is_empty()
    }
}

fn sentinel2_clear_sky() -> TransformChain {
    TransformChain::new()
        .then(QaMask::sentinel2_clouds())
        .then(ScaleOffset::sentinel2_reflectance())
}

/// Picks bands, stretch and preprocessing for `mode` on `sensor`.
///
/// Sentinel-2 reflective composites are cloud masked and scaled to
/// reflectance; its snow layer uses the raw snow probability band. Landsat
/// scenes are already scale-corrected by the catalog, and Landsat snow is
/// the normalized difference of `SR_B3` and `SR_B6`.
pub fn select_layer(sensor: Sensor, mode: VisMode) -> LayerRecipe {
    let (vis, preprocess, derivation) = match (sensor, mode) {
        (Sensor::Sentinel2, VisMode::TrueColor) => (
            VisParams::rgb(&["B4", "B3", "B2"], 0.0, 0.3),
            sentinel2_clear_sky(),
            Derivation::None,
        ),
        (Sensor::Sentinel2, VisMode::WildfireDamage) => (
            VisParams::rgb(&["B12", "B8", "B4"], 0.0, 0.3),
            sentinel2_clear_sky(),
            Derivation::None,
        ),
        (Sensor::Sentinel2, VisMode::SnowProbability) => (
            VisParams::palette("MSK_SNWPRB", -1.0, 1.0, &SNOW_PALETTE),
            TransformChain::new(),
            Derivation::None,
        ),
        (Sensor::Landsat, VisMode::TrueColor) => (
            VisParams::rgb(&["SR_B4", "SR_B3", "SR_B2"], 0.0, 0.3),
            TransformChain::new(),
            Derivation::None,
        ),
        (Sensor::Landsat, VisMode::WildfireDamage) => (
            VisParams::rgb(&["SR_B7", "SR_B5", "SR_B4"], 0.0, 0.3),
            TransformChain::new(),
            Derivation::None,
        ),
        (Sensor::Landsat, VisMode::SnowProbability) => (
            VisParams::palette(NORMALIZED_DIFFERENCE_BAND, -1.0, 1.0, &SNOW_PALETTE),
            TransformChain::new(),
            Derivation::NormalizedDifference("SR_B3", "SR_B6"),
        ),
    };

    LayerRecipe {
        sensor,
        mode,
        vis,
        preprocess,
        derivation,
    }
}

/// The Landsat true-colour layer the viewer always shows for reference.
pub fn reference_layer() -> LayerRecipe {
    select_layer(Sensor::Landsat, VisMode::TrueColor)
}

/// Names of the preprocessing steps, for logs.
pub(crate) fn step_names(recipe: &LayerRecipe) -> Vec<String> {
    recipe
        .preprocess
        .names()
        .into_iter()
        .map(str::to_string)
        .collect()
}
