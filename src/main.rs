use std::sync::Arc;

use anyhow::{Context, Result};
use glance_activity::{ActivityClient, FileHealthStore};
use glance_core::{Config, LocationProviderKind, RefreshMode};
use glance_snapshot::{Formatter, RefreshScheduler, SnapshotAggregator, TerminalSink};
use glance_weather::{
    FixedLocationSource, IpLocationSource, Location, LocationClient, LocationSource,
    WeatherClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    glance_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("Glance started, config in {}", config.config_dir.display());

    let aggregator = build_aggregator(&config)?;

    let formatter = Formatter::from_config(&config.display);
    let sink = match config.refresh.mode {
        RefreshMode::Interactive => TerminalSink::detailed(formatter),
        RefreshMode::Widget => TerminalSink::widget(formatter),
    };

    let scheduler = RefreshScheduler::start(
        Arc::new(aggregator),
        Arc::new(sink),
        config.refresh.interval(),
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    scheduler.shutdown().await;

    Ok(())
}

fn build_aggregator(config: &Config) -> Result<SnapshotAggregator> {
    let source: Arc<dyn LocationSource> = match config.location.provider {
        LocationProviderKind::Fixed => {
            let (Some(latitude), Some(longitude)) =
                (config.location.latitude, config.location.longitude)
            else {
                anyhow::bail!("Fixed location provider needs latitude and longitude");
            };
            Arc::new(FixedLocationSource::new(Location::new(latitude, longitude)))
        }
        LocationProviderKind::Ip => Arc::new(
            IpLocationSource::new(
                config.location.ip_lookup_url.as_str(),
                config.weather.request_timeout(),
            )
            .context("Failed to create IP location source")?,
        ),
    };

    let weather = WeatherClient::new(
        &config.weather.base_url,
        config.weather.api_key.as_deref().unwrap_or_default(),
        config.weather.request_timeout(),
    )
    .context("Failed to create weather client")?;

    let store = FileHealthStore::new(config.health.samples_path.clone());
    tracing::info!("Reading health samples from {}", store.path().display());

    Ok(SnapshotAggregator::new(
        LocationClient::new(source),
        weather,
        ActivityClient::new(Arc::new(store)),
    )
    .with_branch_timeout(config.refresh.branch_timeout()))
}
