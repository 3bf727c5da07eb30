//! Parameterized zonal-statistics pipeline description.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_json::Value;
use tracing::debug;

use crate::export::{ExportTask, FileFormat};
use crate::expr::{
    FeatureCollection, Filter, Image, ImageCollection, PropertyPredicate,
};
use crate::local::{Facility, LocalImage};
use crate::transform::{ImageTransform, TransformChain};

use super::shape::{OutputSchema, Record};
use super::zonal::{ReductionShape, ZonalReduction, INDEX_PROPERTY};
use super::PipelineError;

/// Image property holding acquisition time in epoch milliseconds.
pub const TIME_START_PROPERTY: &str = "system:time_start";

/// Acquisition window applied to an image collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DateWindow {
    /// Inclusive start date.
    pub start: NaiveDate,
    /// Exclusive end date.
    pub end: NaiveDate,
    /// Inclusive calendar month range, e.g. `(6, 8)` for June-August.
    pub months: Option<(u32, u32)>,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            months: None,
        }
    }

    pub fn with_months(mut self, first: u32, last: u32) -> Self {
        self.months = Some((first, last));
        self
    }

    /// Whether an acquisition at `millis` falls inside the window.
    pub fn contains_millis(&self, millis: i64) -> bool {
        let Some(time) = DateTime::<Utc>::from_timestamp_millis(millis) else {
            return false;
        };
        let date = time.date_naive();
        if date < self.start || date >= self.end {
            return false;
        }
        match self.months {
            Some((first, last)) => (first..=last).contains(&date.month()),
            None => true,
        }
    }

    fn apply(&self, collection: &ImageCollection) -> ImageCollection {
        let start = self.start.format("%Y-%m-%d").to_string();
        let end = self.end.format("%Y-%m-%d").to_string();
        let filtered = collection.filter_date(&start, &end);
        match self.months {
            Some((first, last)) => filtered.filter(&Filter::calendar_range(first, last, "month")),
            None => filtered,
        }
    }
}

/// One export unit: a facility subset, optionally with its own image.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Short label, e.g. `CONUS`.
    pub label: String,
    /// Export task description (also the output file name prefix).
    pub description: String,
    /// All predicates must hold for a facility to be included.
    pub facility_filter: Vec<PropertyPredicate>,
    /// `system:index` of the single image to reduce (per-feature pipelines).
    pub image_index: Option<String>,
}

impl Partition {
    pub fn new(label: &str, description: &str) -> Self {
        Self {
            label: label.to_string(),
            description: description.to_string(),
            facility_filter: Vec::new(),
            image_index: None,
        }
    }

    /// Adds a facility condition such as `STATE != 'HI'`.
    pub fn with_filter(mut self, condition: &str) -> Result<Self, PipelineError> {
        self.facility_filter.push(condition.parse::<PropertyPredicate>()?);
        Ok(self)
    }

    pub fn with_image_index(mut self, index: &str) -> Self {
        self.image_index = Some(index.to_string());
        self
    }

    fn remote_filter(&self) -> Option<Filter> {
        let mut filters: Vec<Filter> = self.facility_filter.iter().map(|p| p.to_filter()).collect();
        match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(Filter::and(filters)),
        }
    }

    fn includes(&self, facility: &Facility) -> bool {
        self.facility_filter
            .iter()
            .all(|p| p.matches(&facility.properties))
    }
}

/// Everything that distinguishes one zonal pipeline from another.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub name: String,
    pub dataset: String,
    pub band: String,
    pub window: Option<DateWindow>,
    pub transforms: TransformChain,
    pub reduction: ZonalReduction,
    pub schema: OutputSchema,
    /// Default facility asset; the `assets` config keys override it.
    pub facilities: String,
    pub folder: Option<String>,
    pub partitions: Vec<Partition>,
}

impl PipelineSpec {
    pub fn builder(name: &str) -> PipelineSpecBuilder {
        PipelineSpecBuilder::new(name)
    }

    pub fn partition(&self, label: &str) -> Option<&Partition> {
        self.partitions
            .iter()
            .find(|p| p.label.eq_ignore_ascii_case(label))
    }

    /// Builds the remote result collection for one partition.
    pub fn build_partition(
        &self,
        partition: &Partition,
        facilities: &FeatureCollection,
    ) -> Result<FeatureCollection, PipelineError> {
        let features = match partition.remote_filter() {
            Some(filter) => facilities.filter(&filter),
            None => facilities.clone(),
        };
        let mut collection = ImageCollection::load(&self.dataset);
        if let Some(window) = &self.window {
            collection = window.apply(&collection);
        }

        let result = match self.reduction.shape {
            ReductionShape::PerFeature => {
                let index = partition.image_index.as_deref().ok_or_else(|| {
                    PipelineError::MissingImageIndex(partition.label.clone())
                })?;
                let image = collection
                    .filter(&Filter::eq(INDEX_PROPERTY, index))
                    .first();
                let image = self.prepare_single(&image);
                self.reduction.reduce_per_feature(
                    &image,
                    &features,
                    &self.schema.id_field,
                    &self.schema.value_field,
                )
            }
            ReductionShape::PerImage => {
                let processed = collection.map(|img| self.transforms.apply(&img));
                let date_field = self.schema.date_field.as_deref().unwrap_or("date");
                self.reduction.reduce_per_image(
                    &processed,
                    &features,
                    &self.schema.id_field,
                    &self.schema.value_field,
                    date_field,
                )
            }
        };
        Ok(result)
    }

    /// Single-image path: select the band under its output name, then transform.
    fn prepare_single(&self, image: &Image) -> Image {
        let selected = if self.band == self.schema.value_field {
            image.select(&[self.band.as_str()])
        } else {
            image.select_as(&[self.band.as_str()], &[self.schema.value_field.as_str()])
        };
        self.transforms.apply(&selected)
    }

    /// One export task per partition, in declaration order.
    pub fn export_tasks(&self, facilities_asset: &str) -> Result<Vec<ExportTask>, PipelineError> {
        let facilities = FeatureCollection::load(facilities_asset);
        self.partitions
            .iter()
            .map(|partition| {
                let collection = self.build_partition(partition, &facilities)?;
                debug!(
                    pipeline = %self.name,
                    partition = %partition.label,
                    "Built partition request"
                );
                Ok(ExportTask {
                    description: partition.description.clone(),
                    collection,
                    format: FileFormat::Csv,
                    folder: self.folder.clone(),
                    selectors: self.schema.selectors.clone(),
                })
            })
            .collect()
    }

    /// Evaluates one partition against in-memory images and facilities.
    pub fn run_local(
        &self,
        partition: &Partition,
        images: &[LocalImage],
        facilities: &[Facility],
    ) -> Result<Vec<Record>, PipelineError> {
        let selected: Vec<Facility> = facilities
            .iter()
            .filter(|f| partition.includes(f))
            .cloned()
            .collect();

        let candidates: Vec<&LocalImage> = match self.reduction.shape {
            ReductionShape::PerFeature => {
                let index = partition.image_index.as_deref().ok_or_else(|| {
                    PipelineError::MissingImageIndex(partition.label.clone())
                })?;
                images
                    .iter()
                    .find(|img| img.property(INDEX_PROPERTY).and_then(Value::as_str) == Some(index))
                    .into_iter()
                    .collect()
            }
            ReductionShape::PerImage => images
                .iter()
                .filter(|img| self.in_window(img))
                .collect(),
        };

        let mut rows = Vec::new();
        for image in candidates {
            let processed = self.transforms.apply_local(image)?;
            rows.extend(self.reduction.reduce_local(&processed, &self.band, &selected)?);
        }
        Ok(self.schema.shape(rows))
    }

    fn in_window(&self, image: &LocalImage) -> bool {
        match &self.window {
            None => true,
            Some(window) => image
                .property(TIME_START_PROPERTY)
                .and_then(Value::as_i64)
                .is_some_and(|millis| window.contains_millis(millis)),
        }
    }
}

/// Builder for [`PipelineSpec`].
#[derive(Debug)]
pub struct PipelineSpecBuilder {
    name: String,
    dataset: Option<String>,
    band: Option<String>,
    window: Option<DateWindow>,
    transforms: TransformChain,
    reduction: Option<ZonalReduction>,
    schema: Option<OutputSchema>,
    facilities: Option<String>,
    folder: Option<String>,
    partitions: Vec<Partition>,
}

impl PipelineSpecBuilder {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dataset: None,
            band: None,
            window: None,
            transforms: TransformChain::new(),
            reduction: None,
            schema: None,
            facilities: None,
            folder: None,
            partitions: Vec::new(),
        }
    }

    pub fn dataset(mut self, id: &str) -> Self {
        self.dataset = Some(id.to_string());
        self
    }

    pub fn band(mut self, band: &str) -> Self {
        self.band = Some(band.to_string());
        self
    }

    pub fn window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn transform(mut self, step: impl ImageTransform + 'static) -> Self {
        self.transforms = self.transforms.then(step);
        self
    }

    pub fn reduction(mut self, reduction: ZonalReduction) -> Self {
        self.reduction = Some(reduction);
        self
    }

    pub fn schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn facilities(mut self, asset: &str) -> Self {
        self.facilities = Some(asset.to_string());
        self
    }

    pub fn folder(mut self, folder: &str) -> Self {
        self.folder = Some(folder.to_string());
        self
    }

    pub fn partition(mut self, partition: Partition) -> Self {
        self.partitions.push(partition);
        self
    }

    pub fn build(self) -> Result<PipelineSpec, PipelineError> {
        let missing = |field: &'static str| PipelineError::Incomplete {
            pipeline: self.name.clone(),
            field,
        };
        let dataset = self.dataset.clone().ok_or_else(|| missing("dataset"))?;
        let band = self.band.clone().ok_or_else(|| missing("band"))?;
        let reduction = self.reduction.clone().ok_or_else(|| missing("reduction"))?;
        let schema = self.schema.clone().ok_or_else(|| missing("schema"))?;
        let facilities = self.facilities.clone().ok_or_else(|| missing("facilities"))?;
        if self.partitions.is_empty() {
            return Err(missing("partitions"));
        }

        Ok(PipelineSpec {
            name: self.name,
            dataset,
            band,
            window: self.window,
            transforms: self.transforms,
            reduction,
            schema,
            facilities,
            folder: self.folder,
            partitions: self.partitions,
        })
    }
}
