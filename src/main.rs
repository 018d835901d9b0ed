use std::path::Path;

use clap::Parser;
use poolgate::cli::{check, probe, run, Cli, Commands};
use poolgate::config::ManagerConfig;
use poolgate::error::Result;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match dispatch(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Run the selected command. `Ok(false)` means it ran but found the
/// backend unhealthy.
async fn dispatch(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Check => check::execute(&cli.config).map(|()| true),
        Commands::Probe => probe::execute(load(&cli.config)?).await,
        Commands::Run => run::execute(load(&cli.config)?).await.map(|()| true),
    }
}

fn load(path: &Path) -> Result<ManagerConfig> {
    let config = ManagerConfig::load(path)?;
    config.logging.init();
    Ok(config)
}
