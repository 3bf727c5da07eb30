//! Heat-index command - register the 2018 CONUS heat-index layer.

use clap::Args;
use eezonal::api::map_request;
use eezonal::viz::{heat_index_image, heat_index_vis};

use super::common::print_json;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `eezonal heat-index`.
#[derive(Debug, Args)]
pub struct HeatIndexArgs {
    /// Print the request body instead of calling the service
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the heat-index command.
pub fn run(args: HeatIndexArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    let image = heat_index_image();
    let vis = heat_index_vis();

    if args.dry_run {
        return print_json("heat_index", &map_request(&image, &vis));
    }

    let layer = runner.earth_engine()?.create_map(&image, &vis)?;
    println!("Heat index layer:");
    println!("  {}", layer.tile_url);
    Ok(())
}
