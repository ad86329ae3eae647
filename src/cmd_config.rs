//! `check-config` subcommand.

use std::path::Path;

use jobplane_config::{ConfigLoader, ConfigValidator};

/// Load and validate a config file, printing errors and warnings.
///
/// Exits with status 1 when the file has validation errors.
pub(crate) fn check_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigLoader::load(path)?;
    let result = ConfigValidator::validate(&config)?;

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &result.errors {
        println!("error: {}: {}", error.path, error.message);
    }

    if result.is_valid() {
        println!(
            "{} is valid ({} warnings)",
            path.display(),
            result.warnings.len()
        );
        Ok(())
    } else {
        println!("{} has {} errors", path.display(), result.errors.len());
        std::process::exit(1);
    }
}
