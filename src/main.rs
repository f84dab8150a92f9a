// src/main.rs — tideflow entry point

use std::path::PathBuf;

use clap::Parser;

use tideflow::engine::runner;
use tideflow::infra::config::Config;
use tideflow::infra::errors::TideflowError;
use tideflow::infra::logger;

#[derive(Parser)]
#[command(
    name = "tideflow",
    version,
    about = "Lightweight workflow automation engine: triggers in, workflows out"
)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long)]
    config: PathBuf,

    /// Directory containing workflow scripts
    #[arg(long)]
    workflows: PathBuf,

    /// Directory containing external trigger scripts
    #[arg(long)]
    triggers: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize logging before any plugin loading (respects RUST_LOG)
    logger::init_logging("info");

    if let Err(e) = run().await {
        // A missing config file is a user mistake, not a crash: report it
        // plainly. Everything else gets the full diagnostic chain.
        match e.downcast_ref::<TideflowError>() {
            Some(TideflowError::ConfigMissing(path)) => {
                eprintln!("error: configuration file '{}' not found", path.display());
            }
            _ => eprintln!("error: {e:?}"),
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    let mut engine = runner::start(&config, cli.triggers.as_deref(), &cli.workflows)?;

    tokio::select! {
        _ = engine.wait() => {
            tracing::info!("all triggers finished");
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
        }
    }
    engine.shutdown();
    engine.wait().await;

    tracing::info!("tideflow stopped");
    Ok(())
}
