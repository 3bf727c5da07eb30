//! End-to-end pipeline tests against a scripted service and in-memory rasters.

use chrono::NaiveDate;
use serde_json::json;
use tempfile::TempDir;

use eezonal::api::{ApiError, EarthEngine, MockHttpClient};
use eezonal::local::{Band, Facility, Grid, LocalImage, Zone};
use eezonal::pipeline::presets::{self, FACILITY_ID, STATE, STUDY_PRISONS_ASSET};
use eezonal::pipeline::{write_csv, INDEX_PROPERTY, TIME_START_PROPERTY};

fn millis(y: i32, m: u32, d: u32) -> i64 {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_millis()
}

#[test]
fn canopy_exports_start_one_task_per_partition() {
    let mock = MockHttpClient::new()
        .respond(Ok(json!({"name": "projects/demo/operations/CONUS"})))
        .respond(Ok(json!({"name": "projects/demo/operations/AK"})))
        .respond(Ok(json!({"name": "projects/demo/operations/HI"})));
    let ee = EarthEngine::new(mock, "demo", "token");

    let tasks = presets::canopy_cover()
        .unwrap()
        .export_tasks(STUDY_PRISONS_ASSET)
        .unwrap();
    let operations: Vec<String> = tasks
        .iter()
        .map(|t| ee.start_table_export(t))
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        operations,
        vec![
            "projects/demo/operations/CONUS",
            "projects/demo/operations/AK",
            "projects/demo/operations/HI"
        ]
    );
}

#[test]
fn lst_export_request_body() {
    let mock = MockHttpClient::new().respond(Ok(json!({"name": "projects/demo/operations/LST"})));
    let ee = EarthEngine::new(mock, "demo", "token");

    let tasks = presets::lst_day()
        .unwrap()
        .export_tasks(STUDY_PRISONS_ASSET)
        .unwrap();
    let task = tasks[0].clone().with_suffix("2023_09_05");
    ee.start_table_export(&task).unwrap();

    let body = task.to_request().unwrap();
    assert_eq!(body["description"], "prison_lst_daily_all_2023_09_05");
    assert_eq!(body["fileExportOptions"]["fileFormat"], "CSV");
    assert_eq!(
        body["fileExportOptions"]["driveDestination"]["folder"],
        "gee_exports"
    );
    assert!(body.get("selectors").is_none());
}

#[test]
fn service_errors_stop_the_run() {
    let mock = MockHttpClient::new().respond(Err(ApiError::Status {
        status: 404,
        message: "Table not found".to_string(),
    }));
    let ee = EarthEngine::new(mock, "demo", "token");

    let tasks = presets::canopy_cover()
        .unwrap()
        .export_tasks(STUDY_PRISONS_ASSET)
        .unwrap();
    let result: Result<Vec<String>, ApiError> =
        tasks.iter().map(|t| ee.start_table_export(t)).collect();
    assert!(matches!(result, Err(ApiError::Status { status: 404, .. })));
}

#[test]
fn masked_pixel_excluded_from_mean() {
    // 2x2 grid of 1 km pixels, last pixel fails the daytime QA check.
    let grid = Grid::new(2, 2, 0.0, 2000.0, 1000.0);
    let image = LocalImage::new(grid)
        .with_band("LST_Day_1km", Band::new(vec![10.0, 20.0, 30.0, 40.0]))
        .unwrap()
        .with_band("QC_Day", Band::new(vec![0.0, 0.0, 0.0, 3.0]))
        .unwrap()
        .with_property(INDEX_PROPERTY, "2020_07_04")
        .with_property(TIME_START_PROPERTY, millis(2020, 7, 4));
    let facility = Facility::new("F-1", Zone::rect(0.0, 0.0, 2000.0, 2000.0));

    let spec = presets::lst_day().unwrap();
    let records = spec
        .run_local(&spec.partitions[0], &[image], &[facility])
        .unwrap();

    assert_eq!(records.len(), 1);
    let expected = [10.0, 20.0, 30.0]
        .iter()
        .map(|v| v * 0.02 - 273.15)
        .sum::<f64>()
        / 3.0;
    let mean = records[0].get("LST_mean").and_then(|v| v.as_f64()).unwrap();
    assert!((mean - expected).abs() < 1e-9);
}

#[test]
fn canopy_local_run_writes_csv() {
    let grid = Grid::new(2, 2, 0.0, 2000.0, 1000.0);
    let image = LocalImage::new(grid)
        .with_band("percent_tree_cover", Band::new(vec![10.0, 20.0, 30.0, 40.0]))
        .unwrap()
        .with_property(INDEX_PROPERTY, "2016");
    let facilities = vec![
        Facility::new("CO-7", Zone::rect(0.0, 1000.0, 1000.0, 2000.0)).with_property(STATE, "CO"),
        Facility::new("HI-2", Zone::rect(0.0, 0.0, 2000.0, 2000.0)).with_property(STATE, "HI"),
    ];

    let spec = presets::canopy_cover().unwrap();
    let conus = spec.partition("conus").unwrap();
    let records = spec.run_local(conus, &[image], &facilities).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get(FACILITY_ID), Some(&json!("CO-7")));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("prison_canopy_CONUS.csv");
    let file = std::fs::File::create(&path).unwrap();
    write_csv(file, &spec.schema, &records).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("FACILITYID,percent_tree_cover"));
    assert!(lines.next().unwrap().starts_with("CO-7,"));
    assert_eq!(lines.next(), None);
}
