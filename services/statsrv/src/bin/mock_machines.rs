//! mock-machines - event generator for development and manual testing
//!
//! Simulates a fleet of on/off machines: registers a simple rule for each
//! one with the rule-storage service (optional), then pushes randomized
//! events onto the inbound queue at a fixed interval.

use anyhow::{Context, Result};
use clap::Parser;
use common::RedisClient;
use pulse_model::Event;
use rand::Rng;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about = "mock-machines - MachinePulse event generator")]
struct Args {
    /// Redis URL
    #[arg(long, default_value = "redis://localhost:6379")]
    redis_url: String,

    /// Rule-storage service URL; skip rule registration when omitted
    #[arg(long)]
    api_url: Option<String>,

    /// Inbound queue name
    #[arg(long, default_value = "machine_data")]
    queue: String,

    /// Number of simulated machines
    #[arg(long, default_value_t = 3)]
    machines: usize,

    /// Total events to emit (0 = run forever)
    #[arg(long, default_value_t = 0)]
    count: u64,

    /// Interval between events in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
}

const ON_OFF_RULE: &str = r#"if(signal == 1, "running", "stopped")"#;

async fn register_rules(api_url: &str, machines: usize) -> Result<()> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")?;

    for i in 0..machines {
        let machine_id = format!("machine_{}", i);
        let url = format!(
            "{}/machines/{}/logic",
            api_url.trim_end_matches('/'),
            machine_id
        );
        let response = http
            .post(&url)
            .json(&serde_json::json!({ "logic": ON_OFF_RULE }))
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?;
        if response.status().is_success() {
            info!("Registered rule for {}", machine_id);
        } else {
            warn!(
                "Rule registration for {} returned {}",
                machine_id,
                response.status()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    common::logging::init("info")?;

    if let Some(api_url) = &args.api_url {
        register_rules(api_url, args.machines).await?;
    }

    let redis = RedisClient::new(&args.redis_url)
        .await
        .context("Failed to connect to Redis")?;
    info!(
        "Emitting events for {} machines to {} every {}ms",
        args.machines, args.queue, args.interval_ms
    );

    let mut emitted = 0u64;
    loop {
        let timestamp = redis.time_millis().await? / 1000;
        let (machine_id, signal) = {
            // thread_rng is not Send, so keep it out of await scope
            let mut rng = rand::thread_rng();
            (
                format!("machine_{}", rng.gen_range(0..args.machines)),
                rng.gen_range(0..=1),
            )
        };
        let event = Event {
            machine_id,
            timestamp,
            signal,
        };
        let json = serde_json::to_string(&event)?;
        redis.rpush(&args.queue, &json).await?;
        info!(
            "Emitted {{machine_id: {}, timestamp: {}, signal: {}}}",
            event.machine_id, event.timestamp, event.signal
        );

        emitted += 1;
        if args.count > 0 && emitted >= args.count {
            break;
        }
        tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
    }

    info!("Done, emitted {} events", emitted);
    Ok(())
}
