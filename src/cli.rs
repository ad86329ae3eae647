//! CLI definitions for jobplane.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// jobplane CLI.
#[derive(Parser)]
#[command(name = "jobplane")]
#[command(about = "Control plane for persisted cron jobs")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/jobplane.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the scheduler and HTTP API in foreground (default)
    Run {
        /// Server host, overrides `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Server port, overrides `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// List registered job types
    Types {
        /// Output format (table, json)
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Validate the configuration file
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["jobplane"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("config/jobplane.toml"));
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::try_parse_from([
            "jobplane",
            "--config",
            "/etc/jobplane.toml",
            "run",
            "--port",
            "9090",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/jobplane.toml"));
        match cli.command {
            Some(Commands::Run { host, port }) => {
                assert!(host.is_none());
                assert_eq!(port, Some(9090));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_check_config_subcommand() {
        let cli = Cli::try_parse_from(["jobplane", "check-config", "-c", "x.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::CheckConfig)));
        assert_eq!(cli.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn test_types_format() {
        let cli = Cli::try_parse_from(["jobplane", "types", "--format", "json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Types { ref format }) if format == "json"));
    }
}
