//! SalaryFX Command-Line Client
//!
//! Converts amounts between currencies and searches job listings with
//! salaries shown in a chosen display currency.

use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;

use cli::Cli;
use config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    let config = AppConfig::from_env();

    // Initialize logging; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(config.log_json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!config.log_json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .init();

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    debug!(
        rates_url = %config.rates.base_url,
        ttl_secs = config.engine.cache.ttl.as_secs(),
        "Configuration loaded"
    );

    commands::run(args.command, &config, args.json).await
}
