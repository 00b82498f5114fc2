//! logicsrv main program

use anyhow::{Context, Result};
use clap::Parser;
use logicsrv::routes::AppState;
use logicsrv::{create_routes, Config, LogicStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "logicsrv - MachinePulse rule-storage service")]
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
    info!("Starting logicsrv on port {}", config.port);

    let store = match &config.seed_file {
        Some(path) => LogicStore::from_seed_file(path)?,
        None => LogicStore::new(),
    };
    let app = create_routes(Arc::new(AppState { store }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(common::shutdown::wait_for_shutdown())
        .await
        .context("Server error")?;

    info!("logicsrv stopped");
    Ok(())
}
