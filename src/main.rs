use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use windwatch::config::{LoggingConfig, WindWatchConfig};
use windwatch::email::SmtpAlertSink;
use windwatch::scheduler::Scheduler;
use windwatch::weather::WeatherUnlockedClient;

#[tokio::main]
async fn main() -> Result<()> {
    let config = WindWatchConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        version = windwatch::VERSION,
        postcode = %config.weather.postcode,
        maximum_wind_speed_kph = config.alerts.maximum_wind_speed_kph,
        "starting windwatch"
    );

    let supplier = WeatherUnlockedClient::new(&config.weather)?;
    let sink = SmtpAlertSink::new(config.email.clone());
    let scheduler = Arc::new(Scheduler::new(&config, supplier, sink)?);

    scheduler.run().await;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.clone()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
