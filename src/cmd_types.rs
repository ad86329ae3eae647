//! `types` subcommand.

use jobplane_core::JobTypeRegistry;

/// Print every job type linked into this binary.
pub(crate) fn list_types(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let registry = JobTypeRegistry::discover();
    let types = registry.describe_types();

    if types.is_empty() {
        println!("No job types registered.");
        return Ok(());
    }

    match format {
        "json" => {
            let rows: Vec<_> = types
                .iter()
                .map(|(job_type, description)| {
                    serde_json::json!({ "job_type": job_type, "description": description })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        _ => {
            println!("{:<24} {}", "TYPE", "DESCRIPTION");
            println!("{}", "-".repeat(60));
            for (job_type, description) in types {
                println!("{:<24} {}", job_type, description);
            }
        }
    }

    Ok(())
}
