//! Signal relay - Entry Point
//!
//! Receives webhook trading signals and mirrors them onto the exchange.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Webhook-to-exchange signal relay
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via RELAY_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Determine config path: CLI arg > RELAY_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("RELAY_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let mut config = relay_bot::AppConfig::from_file(&config_path)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    relay_bot::init_logging(&config)?;

    info!("Starting signal relay v{}", env!("CARGO_PKG_VERSION"));
    info!(
        config_path = %config_path,
        network = %config.exchange.network_name,
        port = config.server.port,
        "Configuration loaded"
    );

    let app = relay_bot::Application::connect(config).await?;
    app.run().await?;

    Ok(())
}
