//! The facility pipelines: NLCD canopy cover and MODIS Aqua day/night LST.

use chrono::NaiveDate;

use crate::transform::{QaMask, ScaleOffset};

use super::shape::OutputSchema;
use super::spec::{DateWindow, Partition, PipelineSpec};
use super::zonal::ZonalReduction;
use super::PipelineError;

/// Facility identifier column in the prison assets.
pub const FACILITY_ID: &str = "FACILITYID";

/// State code column used to split the canopy exports.
pub const STATE: &str = "STATE";

/// Facility footprints used by the canopy and daytime LST runs.
pub const STUDY_PRISONS_ASSET: &str = "projects/ee-ccmothes/assets/study_prisons";

/// Facility footprints used by the night-time LST run.
pub const NIGHT_PRISONS_ASSET: &str = "projects/ee-ccmothes/assets/prisons_1";

/// Drive folder the LST exports are written to.
pub const LST_EXPORT_FOLDER: &str = "gee_exports";

const NLCD_2016: &str = "USGS/NLCD_RELEASES/2016_REL";
const MODIS_AQUA_LST: &str = "MODIS/061/MYD11A1";

/// Names accepted by [`by_name`].
pub const PIPELINE_NAMES: [&str; 3] = ["canopy", "lst-day", "lst-night"];

/// Looks up a preset by its command-line name.
pub fn by_name(name: &str) -> Result<PipelineSpec, PipelineError> {
    match name {
        "canopy" => canopy_cover(),
        "lst-day" => lst_day(),
        "lst-night" => lst_night(),
        other => Err(PipelineError::UnknownPipeline(other.to_string())),
    }
}

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, PipelineError> {
    NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| PipelineError::InvalidDate(format!("{:04}-{:02}-{:02}", y, m, d)))
}

/// Mean 2016 NLCD tree canopy cover within 1 km of each facility.
///
/// Alaska and Hawaii have their own NLCD images, so the facility table is
/// split three ways and each part is exported on its own.
pub fn canopy_cover() -> Result<PipelineSpec, PipelineError> {
    PipelineSpec::builder("canopy")
        .dataset(NLCD_2016)
        .band("percent_tree_cover")
        .reduction(ZonalReduction::per_feature(30.0).with_buffer(1000.0))
        .schema(
            OutputSchema::new(FACILITY_ID, "percent_tree_cover")
                .with_selectors(&[FACILITY_ID, "percent_tree_cover"]),
        )
        .facilities(STUDY_PRISONS_ASSET)
        .partition(
            Partition::new("CONUS", "prison_canopy_CONUS")
                .with_filter("STATE != 'HI'")?
                .with_filter("STATE != 'AK'")?
                .with_image_index("2016"),
        )
        .partition(
            Partition::new("AK", "prison_canopy_AK")
                .with_filter("STATE == 'AK'")?
                .with_image_index("2016_AK"),
        )
        .partition(
            Partition::new("HI", "prison_canopy_HI")
                .with_filter("STATE == 'HI'")?
                .with_image_index("2016_HI"),
        )
        .build()
}

/// Daily summer daytime LST (°C) per facility, quality-filtered.
pub fn lst_day() -> Result<PipelineSpec, PipelineError> {
    PipelineSpec::builder("lst-day")
        .dataset(MODIS_AQUA_LST)
        .band("LST_Day_1km")
        .window(DateWindow::new(date(2013, 1, 1)?, date(2023, 8, 31)?).with_months(6, 8))
        .transform(ScaleOffset::modis_lst_celsius("LST_Day_1km"))
        .transform(QaMask::modis_lst_day())
        .reduction(ZonalReduction::per_image(1000.0))
        .schema(OutputSchema::new(FACILITY_ID, "LST_mean").with_date_field("date"))
        .facilities(STUDY_PRISONS_ASSET)
        .folder(LST_EXPORT_FOLDER)
        .partition(Partition::new("ALL", "prison_lst_daily_all"))
        .build()
}

/// Daily summer night-time LST (°C) per facility.
///
/// The night mask checks only the mandatory QA bits, unlike the daytime mask.
pub fn lst_night() -> Result<PipelineSpec, PipelineError> {
    PipelineSpec::builder("lst-night")
        .dataset(MODIS_AQUA_LST)
        .band("LST_Night_1km")
        .window(DateWindow::new(date(2012, 1, 1)?, date(2022, 12, 31)?).with_months(6, 8))
        .transform(ScaleOffset::modis_lst_celsius("LST_Night_1km"))
        .transform(QaMask::modis_lst_night())
        .reduction(ZonalReduction::per_image(1000.0))
        .schema(OutputSchema::new(FACILITY_ID, "LST_mean_night").with_date_field("date"))
        .facilities(NIGHT_PRISONS_ASSET)
        .folder(LST_EXPORT_FOLDER)
        .partition(Partition::new("ALL", "prison_lst_daily_night"))
        .build()
}
