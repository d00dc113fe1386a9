//! tradefuse trader
//!
//! Loads configuration from the environment (and `.env`), starts the trading
//! loop and the status server, and runs until Ctrl-C.

use tokio::signal;
use tradefuse::config::TradingConfig;
use tradefuse::core::runtime::TradingRuntime;
use tradefuse::logging::init_logging;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TradingConfig::from_env()?;
    init_logging(&config.environment)?;

    info!(
        environment = %config.environment,
        symbol = %config.symbol,
        interval_secs = config.interval.as_secs(),
        min_amount = config.bounds.min,
        max_amount = config.bounds.max,
        status_port = config.status_port,
        "Starting tradefuse trader"
    );

    let runtime = TradingRuntime::from_config(config)?;
    runtime.start().await;

    signal::ctrl_c().await?;
    info!("Shutting down...");
    runtime.stop().await;

    Ok(())
}
