//! statsrv main program

use anyhow::{Context, Result};
use clap::Parser;
use common::{retry_with_backoff, RedisClient, RetryPolicy};
use pulse_rtdb::{RedisRtdb, Rtdb, StateRepository};
use pulse_rules::{RuleStore, RuleStoreConfig};
use statsrv::transport::{EventQueue, ResultPublisher};
use statsrv::{Config, Dispatcher, EventProcessor};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "statsrv - MachinePulse event-processing engine")]
struct Args {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    common::logging::init(&config.log_level)?;
    info!(
        "Starting {} with {} workers",
        config.service.name, config.service.worker_count
    );

    let redis = retry_with_backoff(&RetryPolicy::default(), "Redis connection", || {
        RedisClient::new(&config.redis.url)
    })
    .await
    .context("Failed to connect to Redis")?;
    let rtdb: Arc<dyn Rtdb> = Arc::new(RedisRtdb::from_client(Arc::new(redis)));
    info!("Connected to Redis at {}", config.redis.url);

    let queue = EventQueue::new(
        rtdb.clone(),
        config.queues.input.clone(),
        config.queues.block_timeout_seconds,
    );
    queue
        .recover_pending()
        .await
        .context("Failed to recover in-flight events")?;

    let rule_store = RuleStore::new(
        rtdb.clone(),
        RuleStoreConfig {
            api_url: config.logic_api.url.clone(),
            cache_ttl: config.cache_ttl(),
            fetch_timeout: config.fetch_timeout(),
        },
    )?;

    let processor = EventProcessor::new(
        StateRepository::new(rtdb.clone()),
        Arc::new(rule_store),
        ResultPublisher::new(rtdb, config.queues.output.clone()),
    );

    let shutdown = CancellationToken::new();
    let dispatcher = Dispatcher::new(queue, processor, config.service.worker_count);
    let runner = tokio::spawn(dispatcher.run(shutdown.clone()));

    common::shutdown::wait_for_shutdown().await;
    info!("Shutdown signal received, draining workers");
    shutdown.cancel();
    runner.await.context("Dispatcher task panicked")?;

    info!("{} stopped", config.service.name);
    Ok(())
}
