//! Homedash CLI
//!
//! Command-line interface for the homelab dashboard backend.

use std::path::PathBuf;

use clap::Parser;
use homedash::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "homedash")]
#[command(about = "Homelab dashboard backend with graceful degradation")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets();

    if let Some(port) = args.port {
        config.dashboard.port = port;
    }

    tracing::info!("Starting homedash service");
    tracing::debug!(
        "Sources configured: weather={}, github={}, n8n={}, notion={}",
        config.weather.is_configured(),
        config.github.is_configured(),
        config.n8n.is_configured(),
        config.notion.is_configured()
    );

    homedash::run(config).await?;

    Ok(())
}
