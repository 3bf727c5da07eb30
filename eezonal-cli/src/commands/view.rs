//! View command - render the observation nearest to a date.

use chrono::NaiveDate;
use clap::Args;
use eezonal::api::compute_request;
use eezonal::viz::viewer::{layer_requests, observation_for, observation_info};
use eezonal::viz::{view, Sensor, VisMode};

use super::common::{parse_date, print_json, ModeArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `eezonal view`.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Date of interest (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub date: NaiveDate,

    /// Visualization mode
    #[arg(long, value_enum, default_value = "true-color")]
    pub mode: ModeArg,

    /// Print the request bodies instead of calling the service
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the view command.
pub fn run(args: ViewArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    let mode = VisMode::from(args.mode);

    if args.dry_run {
        let image = observation_for(args.date);
        print_json("observation", &compute_request(&observation_info(&image)))?;
        // The layer depends on which sensor the nearest image came from.
        for (label, sensor) in [("sentinel-2", Sensor::Sentinel2), ("landsat", Sensor::Landsat)] {
            let [layer, reference] = layer_requests(&image, sensor, mode);
            print_json(&format!("{} {} layer", label, mode), &layer)?;
            print_json(&format!("{} reference layer", label), &reference)?;
        }
        return Ok(());
    }

    let ee = runner.earth_engine()?;
    let view = view(&ee, args.date, mode)?;

    println!("Date of Observation: {}", view.observation.date);
    println!("Spacecraft: {}", view.observation.spacecraft);
    println!();
    println!("{} layer:", view.mode);
    println!("  {}", view.layer.tile_url);
    println!("true-color reference layer:");
    println!("  {}", view.reference.tile_url);
    Ok(())
}
