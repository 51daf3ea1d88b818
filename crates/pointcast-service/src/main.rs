//! Pointcast binary entry point.
//!
//! Required configuration (flag or environment): `--storage-driver` /
//! `STORAGE_DRIVER`, `--redis-url` / `REDIS_URL`, `--nats-url` / `NATS_URL`.
//! The process refuses to start without them.

use anyhow::Context;
use clap::Parser;
use pointcast_service::{Handlers, NatsPublisher, Outbox, Reconciler, ServiceConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pointcast: versioned pointer store with reliable change notification.
#[derive(Parser, Debug)]
#[command(name = "pointcast")]
#[command(about = "Versioned pointer store with reliable change notification")]
struct Args {
    /// Storage driver name (redis, memory).
    #[arg(long, env = "STORAGE_DRIVER")]
    storage_driver: String,

    /// Redis connection URL.
    #[arg(long, env = "REDIS_URL")]
    redis_url: String,

    /// NATS connection URL.
    #[arg(long, env = "NATS_URL")]
    nats_url: String,

    /// Per-call storage deadline in milliseconds.
    #[arg(long, env = "STORAGE_DEADLINE_MS", default_value_t = ServiceConfig::DEFAULT_STORAGE_DEADLINE_MS)]
    storage_deadline_ms: u64,

    /// Seconds between reconcile rounds.
    #[arg(long, env = "RECONCILE_INTERVAL_SECS", default_value_t = ServiceConfig::DEFAULT_RECONCILE_INTERVAL_SECS)]
    reconcile_interval_secs: u64,

    /// Maximum pending tokens re-announced per round.
    #[arg(long, env = "RECONCILE_BATCH", default_value_t = ServiceConfig::DEFAULT_RECONCILE_BATCH)]
    reconcile_batch: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Args {
    fn into_config(self) -> ServiceConfig {
        ServiceConfig {
            storage_driver: self.storage_driver,
            redis_url: self.redis_url,
            nats_url: self.nats_url,
            storage_deadline: Duration::from_millis(self.storage_deadline_ms),
            reconcile_interval: Duration::from_secs(self.reconcile_interval_secs),
            reconcile_batch: self.reconcile_batch,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = args.into_config();
    info!(
        driver = %config.storage_driver,
        nats_url = %config.nats_url,
        deadline_ms = config.storage_deadline.as_millis() as u64,
        interval_secs = config.reconcile_interval.as_secs(),
        batch = config.reconcile_batch,
        "Configuration loaded"
    );

    let storage = pointcast_storage::connect(&config.storage_driver, &config.redis_url)
        .await
        .context("opening storage backend")?;

    let client = async_nats::connect(config.nats_url.as_str())
        .await
        .context("connecting to NATS")?;

    let publisher = Arc::new(NatsPublisher::new(client.clone()));
    let outbox = Arc::new(Outbox::new(storage, publisher, config.storage_deadline));
    let handlers = Arc::new(Handlers::new(outbox.clone()));

    pointcast_service::handlers::serve(client.clone(), handlers).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = Reconciler::new(outbox, config.reconcile_interval, config.reconcile_batch);
    let reconciler_task = tokio::spawn(reconciler.run(shutdown_rx));

    info!("Pointcast running");
    tokio::signal::ctrl_c().await.context("waiting for ctrl_c")?;
    info!("Received shutdown signal, draining...");

    // Cooperative stop: let an in-flight reconcile round finish, then drain
    // the bus connection so queued replies and announcements flush.
    let _ = shutdown_tx.send(true);
    let _ = reconciler_task.await;
    client.drain().await.context("draining NATS connection")?;

    Ok(())
}
