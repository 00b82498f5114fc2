//! Dispatcher - the worker pool around the event pipeline
//!
//! N workers share one inbound queue. Events for different machines run
//! concurrently; events for the same machine serialize on a per-machine
//! lock so the get-apply-put state transition never interleaves. An event
//! is acked only after its state is persisted and its status published;
//! a failed event is requeued for redelivery.

use crate::processor::EventProcessor;
use crate::transport::EventQueue;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Delay before retrying after a queue fetch error, so a dead Redis does
/// not spin the workers
const FETCH_ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub struct Dispatcher {
    queue: Arc<EventQueue>,
    processor: Arc<EventProcessor>,
    worker_count: usize,
    machine_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl Dispatcher {
    pub fn new(queue: EventQueue, processor: EventProcessor, worker_count: usize) -> Self {
        Self {
            queue: Arc::new(queue),
            processor: Arc::new(processor),
            worker_count,
            machine_locks: Arc::new(DashMap::new()),
        }
    }

    /// Run the worker pool until the token is cancelled. In-flight events
    /// finish before workers exit; unfetched events stay queued.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut workers = JoinSet::new();
        for worker_id in 0..self.worker_count {
            let queue = self.queue.clone();
            let processor = self.processor.clone();
            let locks = self.machine_locks.clone();
            let shutdown = shutdown.clone();
            workers.spawn(async move {
                info!(worker_id, "Worker started");
                worker_loop(worker_id, queue, processor, locks, shutdown).await;
                info!(worker_id, "Worker stopped");
            });
        }
        while workers.join_next().await.is_some() {}
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<EventQueue>,
    processor: Arc<EventProcessor>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    shutdown: CancellationToken,
) {
    loop {
        let inflight = tokio::select! {
            _ = shutdown.cancelled() => return,
            fetched = queue.fetch() => fetched,
        };

        let inflight = match inflight {
            Ok(Some(inflight)) => inflight,
            Ok(None) => continue,
            Err(e) => {
                error!(worker_id, "Queue fetch failed: {}", e);
                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(FETCH_ERROR_BACKOFF) => continue,
                }
            },
        };

        let machine_id = inflight.event.machine_id.clone();
        let lock = locks
            .entry(machine_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        {
            let _guard = lock.lock().await;

            match processor.process(&inflight.event).await {
                Ok(_) => {
                    if let Err(e) = queue.ack(&inflight).await {
                        // The event may be redelivered and reprocessed; the
                        // state transition is idempotent so that is safe.
                        warn!(worker_id, machine_id = %machine_id, "Ack failed: {}", e);
                    }
                },
                Err(e) if e.is_retryable() => {
                    warn!(
                        worker_id,
                        machine_id = %machine_id,
                        "Processing failed, requeueing event: {}", e
                    );
                    if let Err(e) = queue.requeue(&inflight).await {
                        error!(worker_id, machine_id = %machine_id, "Requeue failed: {}", e);
                    }
                },
                Err(e) => {
                    // Non-retryable (e.g. an invalid event): redelivery would
                    // fail identically forever, so drop it.
                    warn!(
                        worker_id,
                        machine_id = %machine_id,
                        "Dropping unprocessable event: {}", e
                    );
                    if let Err(e) = queue.ack(&inflight).await {
                        error!(worker_id, machine_id = %machine_id, "Ack failed: {}", e);
                    }
                },
            }
        }

        // Evict the lock entry when no other worker holds a clone (count 2 =
        // the map's reference plus ours), keeping the map bounded under a
        // churning machine-id population. The shard lock makes the check and
        // the removal atomic with respect to other lookups.
        locks.remove_if(&machine_id, |_, entry| Arc::strong_count(entry) == 2);
    }
}
