//! eezonal CLI - Command-line interface
//!
//! Starts the facility zonal-statistics exports, renders the imagery viewer
//! layers and manages the configuration file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::export::ExportArgs;
use commands::heat_index::HeatIndexArgs;
use commands::view::ViewArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "eezonal")]
#[command(version, about = "Earth Engine zonal statistics for facility footprints", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the configuration file with default settings
    Init,

    /// Start table exports for a facility pipeline
    Export(ExportArgs),

    /// Show the observation nearest to a date as map layers
    View(ViewArgs),

    /// Register the 2018 CONUS Landsat 8 heat-index layer
    HeatIndex(HeatIndexArgs),

    /// View or modify configuration settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Init => commands::init::run(),
        Commands::Export(args) => commands::export::run(args),
        Commands::View(args) => commands::view::run(args),
        Commands::HeatIndex(args) => commands::heat_index::run(args),
        Commands::Config(command) => commands::config::run(command),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_export() {
        let cli = Cli::try_parse_from([
            "eezonal",
            "export",
            "lst-night",
            "--dry-run",
            "--description",
            "2023_09_05",
        ])
        .unwrap();
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.pipeline, commands::common::PipelineArg::LstNight);
                assert!(args.dry_run);
                assert_eq!(args.description.as_deref(), Some("2023_09_05"));
            }
            other => panic!("Expected export, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_view() {
        let cli = Cli::try_parse_from([
            "eezonal",
            "view",
            "--date",
            "2022-05-02",
            "--mode",
            "wildfire-damage",
        ])
        .unwrap();
        match cli.command {
            Commands::View(args) => {
                assert_eq!(args.mode, commands::common::ModeArg::WildfireDamage);
                assert!(!args.dry_run);
            }
            other => panic!("Expected view, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_bad_date() {
        assert!(Cli::try_parse_from(["eezonal", "view", "--date", "May 2"]).is_err());
    }
}
