//! Shutdown signal handling
//!
//! Both services park on [`wait_for_shutdown`]: statsrv to cancel its
//! worker pool and drain in-flight events, logicsrv as axum's
//! graceful-shutdown trigger. Unacked events stay on their queues across
//! a shutdown.

use tracing::{info, warn};

/// Resolve once the process is asked to stop.
///
/// Listens for SIGINT (Ctrl+C) and, on Unix, SIGTERM (what container
/// orchestrators send first).
#[cfg(unix)]
pub async fn wait_for_shutdown() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(sig) => sig,
        Err(e) => {
            warn!("SIGTERM handler unavailable ({}), listening for Ctrl+C only", e);
            let _ = tokio::signal::ctrl_c().await;
            info!("Received SIGINT, shutting down");
            return;
        },
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down"),
        _ = term.recv() => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C, shutting down");
}
