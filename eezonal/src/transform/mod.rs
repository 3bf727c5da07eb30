//! Per-image transforms.
//!
//! A transform is a pure image-to-image mapping. Every transform has two
//! renditions that must agree:
//!
//! - [`ImageTransform::apply`] chains the operation onto a remote [`Image`]
//!   expression, to be used inside a collection `map`.
//! - [`ImageTransform::apply_local`] evaluates the same operation on a
//!   [`LocalImage`].
//!
//! Masking transforms only ever change pixel validity; the grid and the pixel
//! count of every band are left alone.

mod bits;
mod heat;
mod scale;

pub use bits::{BitCondition, BitRange, Comparison, QaMask};
pub use heat::{heat_index, HeatIndex};
pub use scale::{to_celsius, ScaleOffset, KELVIN_OFFSET, MODIS_LST_SCALE};

use std::fmt::Debug;
use std::sync::Arc;

use crate::expr::Image;
use crate::local::{LocalImage, RasterError};

/// A pure per-image operation with remote and local renditions.
pub trait ImageTransform: Debug + Send + Sync {
    /// Short human-readable name for logs.
    fn name(&self) -> &str;

    /// Appends this transform to a remote image expression.
    fn apply(&self, image: &Image) -> Image;

    /// Evaluates this transform on an in-memory image.
    fn apply_local(&self, image: &LocalImage) -> Result<LocalImage, RasterError>;
}

/// Ordered list of transforms applied one after another.
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    steps: Vec<Arc<dyn ImageTransform>>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, step: impl ImageTransform + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn apply(&self, image: &Image) -> Image {
        self.steps
            .iter()
            .fold(image.clone(), |img, step| step.apply(&img))
    }

    pub fn apply_local(&self, image: &LocalImage) -> Result<LocalImage, RasterError> {
        self.steps
            .iter()
            .try_fold(image.clone(), |img, step| step.apply_local(&img))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::{Band, Grid};

    #[test]
    fn test_chain_applies_in_order() {
        let chain = TransformChain::new()
            .then(ScaleOffset::modis_lst_celsius("LST_Day_1km"))
            .then(QaMask::modis_lst_day());
        assert_eq!(chain.names(), vec!["to_celsius", "modis_lst_day_qa"]);

        let img = LocalImage::new(Grid::new(2, 1, 0.0, 1000.0, 1000.0))
            .with_band("LST_Day_1km", Band::new(vec![15000.0, 15000.0]))
            .unwrap()
            // Second pixel has bad data quality (bits 2-3 = 01).
            .with_band("QC_Day", Band::new(vec![0.0, 4.0]))
            .unwrap();

        let out = chain.apply_local(&img).unwrap();
        let lst = out.band("LST_Day_1km").unwrap();
        assert!((lst.values[0] - 26.85).abs() < 1e-9);
        assert_eq!(lst.valid, vec![true, false]);
        assert!(out.band("QC_Day").is_err());
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let chain = TransformChain::new();
        let img = Image::load("x");
        assert_eq!(chain.apply(&img), img);
        assert!(chain.is_empty());
    }
}
