use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use domain::store::{DeviceStore, LockEventStore};
use persistence::db;
use persistence::repositories::{DeviceRepository, LockEventRepository};

mod app;
mod config;
mod error;
mod jobs;
mod logging;
mod routes;
mod services;

use jobs::{JobRunner, OfflineSweepJob};
use services::{FleetService, UnlockScheduler, AUTO_UNLOCK_DELAY};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;
    logging::init_logging(&config.logging);

    info!("Starting Fleet Presence API v{}", env!("CARGO_PKG_VERSION"));

    let pool = db::create_pool(&config.database).await?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let prometheus = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    // Wire the store, the deferred unlock scheduler and the fleet service.
    let devices: Arc<dyn DeviceStore> = Arc::new(DeviceRepository::new(pool.clone()));
    let lock_events: Arc<dyn LockEventStore> = Arc::new(LockEventRepository::new(pool.clone()));
    let unlock = UnlockScheduler::new(Arc::clone(&devices), AUTO_UNLOCK_DELAY);
    let fleet = FleetService::new(Arc::clone(&devices), lock_events, unlock);

    // Start the heartbeat sweep; it runs until shutdown.
    let mut runner = JobRunner::new();
    runner.register(OfflineSweepJob::new(
        devices,
        Duration::from_secs(config.sweeper.interval_secs),
    ));
    runner.start();

    let addr = config.socket_addr();
    let app = app::create_app(config, pool, fleet, Some(prometheus));

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    runner.shutdown();
    runner.wait_for_shutdown(Duration::from_secs(10)).await;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
