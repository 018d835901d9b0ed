//! Command-line interface definitions.

pub mod check;
pub mod probe;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Poolgate - pooled, rate-limited access to a hosted data backend.
#[derive(Parser, Debug)]
#[command(name = "poolgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the configuration and print it without the credential
    Check,

    /// Initialize, run one health check, print metrics and exit
    Probe,

    /// Keep the manager running and log metrics until interrupted
    Run,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_flag_defaults_and_is_global() {
        let cli = Cli::parse_from(["poolgate", "check"]);
        assert_eq!(cli.config, PathBuf::from("config.toml"));
        assert!(matches!(cli.command, Commands::Check));

        let cli = Cli::parse_from(["poolgate", "probe", "--config", "other.toml"]);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Commands::Probe));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["poolgate"]).is_err());
    }
}
