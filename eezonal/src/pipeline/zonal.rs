//! Zonal reduction of images over facility footprints.

use serde_json::Value;

use crate::expr::number::dictionary_set;
use crate::expr::{Feature, FeatureCollection, Filter, Image, ImageCollection, Reducer};
use crate::local::{zonal_mean, Facility, LocalImage, RasterError};

/// Property the mean reducer writes in multi-feature reductions.
pub const MEAN_PROPERTY: &str = "mean";

/// Image property carrying the image's catalog index.
pub const INDEX_PROPERTY: &str = "system:index";

/// How images and features are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionShape {
    /// One image reduced over each feature separately.
    PerFeature,
    /// Every image of a collection reduced over all features, then flattened.
    PerImage,
}

/// Mean-reduction settings shared by the remote and local renditions.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalReduction {
    pub shape: ReductionShape,
    /// Nominal pixel size in metres.
    pub scale: f64,
    /// Outward buffer applied to each footprint, in metres.
    pub buffer: Option<f64>,
}

impl ZonalReduction {
    pub fn per_feature(scale: f64) -> Self {
        Self {
            shape: ReductionShape::PerFeature,
            scale,
            buffer: None,
        }
    }

    pub fn per_image(scale: f64) -> Self {
        Self {
            shape: ReductionShape::PerImage,
            scale,
            buffer: None,
        }
    }

    pub fn with_buffer(mut self, metres: f64) -> Self {
        self.buffer = Some(metres);
        self
    }

    /// Reduces a single-band `image` over each feature.
    ///
    /// Produces geometry-less features with `value_field` and `id_field`;
    /// features whose footprint holds no valid pixel are dropped.
    pub fn reduce_per_feature(
        &self,
        image: &Image,
        features: &FeatureCollection,
        id_field: &str,
        value_field: &str,
    ) -> FeatureCollection {
        let reducer = Reducer::mean();
        features
            .map(|feature| {
                let mut geometry = feature.geometry();
                if let Some(distance) = self.buffer {
                    geometry = geometry.buffer(distance);
                }
                let stats = image.reduce_region(&reducer, &geometry, self.scale);
                let stats = dictionary_set(stats, id_field, feature.get(id_field));
                Feature::without_geometry(stats)
            })
            .filter(&Filter::not_null(&[value_field]))
    }

    /// Reduces every image over all features and flattens the results.
    ///
    /// Each output feature keeps only `value_field` (renamed from the
    /// reducer's `mean`) and `id_field`, plus `date_field` holding the
    /// originating image's `system:index`.
    pub fn reduce_per_image(
        &self,
        images: &ImageCollection,
        features: &FeatureCollection,
        id_field: &str,
        value_field: &str,
        date_field: &str,
    ) -> FeatureCollection {
        let zones = match self.buffer {
            Some(distance) => features.map(|f| f.buffer(distance)),
            None => features.clone(),
        };
        let reducer = Reducer::mean();

        images.flat_map_features(|image| {
            let date = image.get(INDEX_PROPERTY);
            image
                .reduce_regions(&zones, &reducer, self.scale)
                .filter(&Filter::not_null(&[MEAN_PROPERTY]))
                .map(|feature| {
                    feature
                        .select_as(&[MEAN_PROPERTY, id_field], &[value_field, id_field])
                        .set(date_field, date)
                })
        })
    }

    /// Local mean of `band` over each facility, skipping undefined means.
    pub fn reduce_local(
        &self,
        image: &LocalImage,
        band: &str,
        facilities: &[Facility],
    ) -> Result<Vec<ZonalRow>, RasterError> {
        let values = image.band(band)?;
        let date = image
            .property(INDEX_PROPERTY)
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(facilities
            .iter()
            .filter_map(|facility| {
                let zone = match self.buffer {
                    Some(distance) => facility.zone.buffered(distance),
                    None => facility.zone.clone(),
                };
                zonal_mean(values, &image.grid, &zone).map(|mean| ZonalRow {
                    facility_id: facility.id.clone(),
                    image_index: date.clone(),
                    mean,
                })
            })
            .collect())
    }
}

/// One (image, facility) mean.
#[derive(Debug, Clone, PartialEq)]
pub struct ZonalRow {
    pub facility_id: String,
    pub image_index: Option<String>,
    pub mean: f64,
}
