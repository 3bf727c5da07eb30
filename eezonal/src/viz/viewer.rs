//! Date-driven imagery viewer.
//!
//! Given a date and a mode, finds the observation nearest to that date,
//! reports its date and spacecraft, and registers two map layers: the
//! requested mode and a Landsat true-colour reference.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{map_request, ApiError, EarthEngine, HttpClient, MapLayer};
use crate::expr::number::format_date;
use crate::expr::{Expr, Image};

use super::catalog::{nearest_observation, observation_catalog, study_region};
use super::layer::{reference_layer, select_layer, step_names, Sensor, VisMode, SPACECRAFT_PROPERTY};

/// Output format of the observation date.
pub const OBSERVATION_DATE_FORMAT: &str = "YYYY-MM-dd";

/// Date and spacecraft of the selected observation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: String,
    pub spacecraft: String,
}

impl Observation {
    pub fn sensor(&self) -> Sensor {
        Sensor::from_spacecraft(&self.spacecraft)
    }

    fn from_value(value: &Value) -> Result<Self, ApiError> {
        let field = |name: &'static str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(ApiError::MissingField(name))
        };
        Ok(Self {
            date: field("date")?,
            spacecraft: field("spacecraft")?,
        })
    }
}

/// Everything the viewer shows for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub observation: Observation,
    pub mode: VisMode,
    pub layer: MapLayer,
    pub reference: MapLayer,
}

/// Milliseconds since the epoch at UTC midnight of `date`.
pub fn target_millis(date: NaiveDate) -> i64 {
    date.and_time(chrono::NaiveTime::MIN)
        .and_utc()
        .timestamp_millis()
}

/// The nearest observation to `date` in the study area catalog.
pub fn observation_for(date: NaiveDate) -> Image {
    nearest_observation(&observation_catalog(&study_region()), target_millis(date))
}

/// Dictionary expression with the observation's formatted date and spacecraft.
pub fn observation_info(image: &Image) -> Expr {
    let mut info = BTreeMap::new();
    info.insert(
        "date".to_string(),
        format_date(image.date(), OBSERVATION_DATE_FORMAT),
    );
    info.insert("spacecraft".to_string(), image.get(SPACECRAFT_PROPERTY));
    Expr::Dictionary(info)
}

/// Map request bodies for `mode` on `sensor`, followed by the reference layer.
pub fn layer_requests(image: &Image, sensor: Sensor, mode: VisMode) -> [Value; 2] {
    let recipe = select_layer(sensor, mode);
    let reference = reference_layer();
    [
        map_request(&recipe.render(image), &recipe.vis),
        map_request(&reference.render(image), &reference.vis),
    ]
}

/// Runs the viewer against the service.
pub fn view<C: HttpClient>(
    ee: &EarthEngine<C>,
    date: NaiveDate,
    mode: VisMode,
) -> Result<View, ApiError> {
    let image = observation_for(date);

    let observation = Observation::from_value(&ee.compute(&observation_info(&image))?)?;
    info!(
        requested = %date,
        observed = %observation.date,
        spacecraft = %observation.spacecraft,
        "Nearest observation"
    );

    let recipe = select_layer(observation.sensor(), mode);
    debug!(mode = %mode, steps = ?step_names(&recipe), "Rendering layer");
    let layer = ee.create_map(&recipe.render(&image), &recipe.vis)?;

    let reference = reference_layer();
    let reference = ee.create_map(&reference.render(&image), &reference.vis)?;

    Ok(View {
        observation,
        mode,
        layer,
        reference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockHttpClient;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_target_millis_is_utc_midnight() {
        assert_eq!(target_millis(date(1970, 1, 2)), 86_400_000);
        assert_eq!(target_millis(date(2022, 5, 2)), 1_651_449_600_000);
    }

    #[test]
    fn test_observation_info_graph() {
        let graph = observation_info(&observation_for(date(2022, 5, 2)))
            .to_graph()
            .to_string();
        assert!(graph.contains("dictionaryValue"));
        assert!(graph.contains("Date.format"));
        assert!(graph.contains("YYYY-MM-dd"));
        assert!(graph.contains(SPACECRAFT_PROPERTY));
    }

    #[test]
    fn test_view_sentinel_snow() {
        let mock = MockHttpClient::new()
            .respond(Ok(json!({"result": {"date": "2022-05-01", "spacecraft": "Sentinel-2A"}})))
            .respond(Ok(json!({"name": "projects/demo/maps/snow"})))
            .respond(Ok(json!({"name": "projects/demo/maps/reference"})));
        let ee = EarthEngine::new(mock, "demo", "token");

        let view = view(&ee, date(2022, 5, 2), VisMode::SnowProbability).unwrap();
        assert_eq!(view.observation.date, "2022-05-01");
        assert_eq!(view.observation.sensor(), Sensor::Sentinel2);
        assert!(view.layer.tile_url.contains("maps/snow/tiles"));
        assert!(view.reference.tile_url.contains("maps/reference/tiles"));
    }

    #[test]
    fn test_view_missing_spacecraft() {
        let mock = MockHttpClient::new().respond(Ok(json!({"result": {"date": "2022-05-01"}})));
        let ee = EarthEngine::new(mock, "demo", "token");
        assert_eq!(
            view(&ee, date(2022, 5, 2), VisMode::TrueColor),
            Err(ApiError::MissingField("spacecraft"))
        );
    }

    #[test]
    fn test_layer_requests_reference_is_landsat_true_color() {
        let image = Image::load("LANDSAT/LC08/C02/T1_L2/x");
        let [layer, reference] = layer_requests(&image, Sensor::Landsat, VisMode::WildfireDamage);
        assert!(layer.to_string().contains("SR_B7"));
        assert!(reference.to_string().contains("SR_B2"));
        assert!(!reference.to_string().contains("SR_B7"));
    }
}
