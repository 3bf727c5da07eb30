//! Export command - start table exports for a facility pipeline.

use clap::Args;
use eezonal::export::ExportTask;
use eezonal::pipeline::presets;
use tracing::info;

use super::common::{print_json, resolve_folder, PipelineArg};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for `eezonal export`.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Pipeline to run
    #[arg(value_enum)]
    pub pipeline: PipelineArg,

    /// Only export this partition (e.g. CONUS, AK, HI)
    #[arg(long)]
    pub partition: Option<String>,

    /// Drive folder (overrides config and the pipeline default)
    #[arg(long)]
    pub folder: Option<String>,

    /// Suffix appended to each task description, e.g. a run date
    #[arg(long)]
    pub description: Option<String>,

    /// Print the request bodies instead of starting exports
    #[arg(long)]
    pub dry_run: bool,
}

/// Builds the export tasks selected by `args`.
pub fn build_tasks(args: &ExportArgs, runner: &CliRunner) -> Result<Vec<ExportTask>, CliError> {
    let spec = presets::by_name(args.pipeline.preset_name())?;
    if let Some(label) = &args.partition {
        if spec.partition(label).is_none() {
            let known: Vec<&str> = spec.partitions.iter().map(|p| p.label.as_str()).collect();
            return Err(CliError::Config(format!(
                "Pipeline '{}' has no partition '{}' (available: {})",
                spec.name,
                label,
                known.join(", ")
            )));
        }
    }

    let folder = resolve_folder(args.folder.clone(), runner.config());
    let suffix = args.description.as_deref().unwrap_or("");

    let tasks = spec
        .export_tasks(args.pipeline.facilities(&spec, runner.config()))?
        .into_iter()
        .zip(&spec.partitions)
        .filter(|(_, partition)| {
            args.partition
                .as_deref()
                .map_or(true, |label| partition.label.eq_ignore_ascii_case(label))
        })
        .map(|(task, _)| {
            let task = task.with_suffix(suffix);
            match &folder {
                Some(folder) => task.with_folder(folder),
                None => task,
            }
        })
        .collect();
    Ok(tasks)
}

/// Run the export command.
pub fn run(args: ExportArgs) -> Result<(), CliError> {
    let runner = CliRunner::new()?;
    let tasks = build_tasks(&args, &runner)?;

    if args.dry_run {
        for task in &tasks {
            print_json(&task.description, &task.to_request()?)?;
        }
        return Ok(());
    }

    let ee = runner.earth_engine()?;
    for task in &tasks {
        let operation = ee.start_table_export(task)?;
        println!("Started {} ({})", task.description, operation);
    }
    info!(
        pipeline = args.pipeline.preset_name(),
        tasks = tasks.len(),
        "Exports submitted"
    );
    println!();
    println!("Exports run in the background; check the Earth Engine task list for progress.");
    Ok(())
}
