//! jobplane - control plane for persisted cron jobs
//!
//! Main entry point for the jobplane CLI and server.

mod cli;
mod cmd_config;
mod cmd_types;
mod server;

use std::path::Path;

use clap::Parser;
use tracing::warn;

use jobplane_config::ConfigLoader;

use crate::cli::{Cli, Commands};
use crate::cmd_config::check_config;
use crate::cmd_types::list_types;
use crate::server::{init_tracing, run_server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::CheckConfig) => check_config(&cli.config),
        Some(Commands::Types { format }) => list_types(&format),
        Some(Commands::Run { host, port }) => run(&cli.config, host, port).await,
        None => run(&cli.config, None, None).await,
    }
}

async fn run(
    config_path: &Path,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut config, found) = ConfigLoader::load_or_default(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    init_tracing(&config.logging)?;
    if !found {
        warn!(
            "Config file {} not found, using defaults",
            config_path.display()
        );
    }

    run_server(config).await
}
