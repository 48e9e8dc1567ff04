mod config;
mod data;
mod forecast;
mod notify;
mod pipeline;

use anyhow::Result;
use config::{Config, EnvConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 BTC greed forecast starting...");

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    tracing::info!("Loading configuration from {}", config_path);
    let config = Config::load(&config_path)?;
    let env_config = EnvConfig::load()?;

    tracing::info!("Dry run mode: {}", config.system.dry_run || env_config.dry_run);
    tracing::info!(
        "Models: greed ARIMA{:?}, price SARIMAX{:?}x{:?}, horizon {} days",
        config.forecast.greed_order,
        config.forecast.price_order,
        config.forecast.price_seasonal_order,
        config.forecast.horizon_days
    );

    if let Err(e) = pipeline::run_predict(&config, &env_config).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }

    tracing::info!("✅ Prediction run complete");
    Ok(())
}
