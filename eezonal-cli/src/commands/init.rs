//! Init command - initialize configuration file.

use eezonal::config::{config_file_path, ConfigFile, ACCESS_TOKEN_ENV, PROJECT_ENV};

use crate::error::CliError;

/// Run the init command.
///
/// Writes a config file with defaults, keeping any existing settings.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let existed = path.exists();
    let config = if existed {
        ConfigFile::load_from(&path)?
    } else {
        ConfigFile::default()
    };
    config.save_to(&path)?;

    if existed {
        println!("Updated configuration file: {}", path.display());
    } else {
        println!("Created configuration file: {}", path.display());
    }
    println!();
    if config.earthengine.project.is_none() {
        println!("Next, set your Earth Engine Cloud project:");
        println!("  eezonal config set earthengine.project <project-id>");
        println!("  (or export {})", PROJECT_ENV);
        println!();
    }
    println!("Provide an OAuth access token via {}, for example:", ACCESS_TOKEN_ENV);
    println!("  export {}=$(gcloud auth print-access-token)", ACCESS_TOKEN_ENV);
    println!();
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
