use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use geotrack_infrastructure::{AppConfig, ConfigSource};

#[derive(Parser, Debug)]
#[command(name = "geotrack")]
#[command(about = "Real-time location anomaly detector", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    /// JSON-lines event file, `-` for stdin
    #[arg(short, long)]
    input: Option<String>,

    /// WebSocket URL delivering events
    #[arg(long)]
    ws_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("GEOTRACK_CONFIG", config);
    }
    if let Some(input) = args.input {
        std::env::set_var("GEOTRACK_INPUT_PATH", input);
    }
    if let Some(ws_url) = args.ws_url {
        std::env::set_var("GEOTRACK_WS_URL", ws_url);
    }

    let (config, source) = AppConfig::load().await?;
    let _log_guard = geotrack_bootstrap::telemetry::init_tracing(
        &config.log_format,
        config.log_dir.as_deref(),
    );
    match &source {
        ConfigSource::File(path) => info!("config loaded from {}", path),
        ConfigSource::Defaults(path) => warn!("{} not found, using defaults", path),
    }
    info!(
        "geotrack starting: workers={}, threshold_km={}, state_fetch_policy={}",
        config.workers, config.anomaly_threshold_km, config.state_fetch_policy
    );

    geotrack_bootstrap::run(config).await?;
    Ok(())
}
