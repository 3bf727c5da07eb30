//! Common types and utilities shared across CLI commands.

use chrono::NaiveDate;
use clap::ValueEnum;
use eezonal::config::ConfigFile;
use eezonal::pipeline::PipelineSpec;
use eezonal::viz::VisMode;
use serde_json::Value;

use crate::error::CliError;

/// Facility pipeline selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PipelineArg {
    /// NLCD 2016 tree canopy cover, split CONUS/AK/HI
    Canopy,
    /// MODIS Aqua daytime land surface temperature, summers 2013-2023
    LstDay,
    /// MODIS Aqua night-time land surface temperature, summers 2012-2022
    LstNight,
}

impl PipelineArg {
    /// Preset name understood by `eezonal::pipeline::presets::by_name`.
    pub fn preset_name(&self) -> &'static str {
        match self {
            PipelineArg::Canopy => "canopy",
            PipelineArg::LstDay => "lst-day",
            PipelineArg::LstNight => "lst-night",
        }
    }

    /// Facility asset override for this pipeline from config.
    pub fn facilities_override<'a>(&self, config: &'a ConfigFile) -> Option<&'a str> {
        match self {
            PipelineArg::LstNight => config.assets.facilities_night.as_deref(),
            _ => config.assets.facilities.as_deref(),
        }
    }

    /// Configured facility asset, else the pipeline's own.
    pub fn facilities<'a>(&self, spec: &'a PipelineSpec, config: &'a ConfigFile) -> &'a str {
        self.facilities_override(config).unwrap_or(&spec.facilities)
    }
}

/// Viewer mode selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ModeArg {
    /// Natural colour composite
    TrueColor,
    /// SWIR/NIR/red false colour highlighting burn scars
    WildfireDamage,
    /// Snow probability (Sentinel-2) or NDSI (Landsat)
    SnowProbability,
}

impl From<ModeArg> for VisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::TrueColor => VisMode::TrueColor,
            ModeArg::WildfireDamage => VisMode::WildfireDamage,
            ModeArg::SnowProbability => VisMode::SnowProbability,
        }
    }
}

/// Parses a `YYYY-MM-DD` date argument.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{}' (expected YYYY-MM-DD): {}", s, e))
}

/// Pretty-prints a request body for `--dry-run`.
pub fn print_json(label: &str, value: &Value) -> Result<(), CliError> {
    println!("# {}", label);
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// CLI value, else config value.
pub fn resolve_folder(cli_folder: Option<String>, config: &ConfigFile) -> Option<String> {
    cli_folder.or_else(|| config.export.folder.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eezonal::pipeline::presets;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2022-05-02"),
            Ok(NaiveDate::from_ymd_opt(2022, 5, 2).unwrap())
        );
        assert!(parse_date("05/02/2022").is_err());
    }

    #[test]
    fn test_pipeline_facilities_default_to_preset() {
        let config = ConfigFile::default();
        let night = presets::lst_night().unwrap();
        assert_eq!(
            PipelineArg::LstNight.facilities(&night, &config),
            presets::NIGHT_PRISONS_ASSET
        );
        let canopy = presets::canopy_cover().unwrap();
        assert_eq!(
            PipelineArg::Canopy.facilities(&canopy, &config),
            presets::STUDY_PRISONS_ASSET
        );
    }

    #[test]
    fn test_pipeline_facilities_config_override() {
        let mut config = ConfigFile::default();
        config.assets.facilities_night = Some("projects/p/assets/night".to_string());
        let night = presets::lst_night().unwrap();
        let day = presets::lst_day().unwrap();
        assert_eq!(
            PipelineArg::LstNight.facilities(&night, &config),
            "projects/p/assets/night"
        );
        assert_eq!(
            PipelineArg::LstDay.facilities(&day, &config),
            presets::STUDY_PRISONS_ASSET
        );
    }

    #[test]
    fn test_resolve_folder_precedence() {
        let mut config = ConfigFile::default();
        config.export.folder = Some("from_config".to_string());
        assert_eq!(
            resolve_folder(Some("from_cli".to_string()), &config).as_deref(),
            Some("from_cli")
        );
        assert_eq!(resolve_folder(None, &config).as_deref(), Some("from_config"));
    }

    #[test]
    fn test_preset_names_resolve() {
        for arg in PipelineArg::value_variants() {
            assert!(presets::by_name(arg.preset_name()).is_ok());
        }
    }
}
