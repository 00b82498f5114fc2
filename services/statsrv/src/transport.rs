//! Transport adapters over the durable Redis-list queues
//!
//! Inbound events follow the reliable-queue pattern: a fetch atomically
//! moves the raw message from the input queue to a companion processing
//! list, where it stays visible until acked (`LREM`) or requeued
//! (`LREM` + `RPUSH` back). A crashed worker therefore never loses an
//! event; `recover_pending` drains the processing list back to the input
//! queue at startup.
//!
//! Outbound status updates are fire-and-forget pushes to the output queue.

use bytes::Bytes;
use errors::{PulseError, PulseResult};
use pulse_model::{Event, StatusUpdate};
use pulse_rtdb::{keyspace, Rtdb};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A fetched event together with its raw queue payload.
///
/// The raw payload is what gets removed from the processing list on
/// ack/requeue, so it must be carried around unmodified.
#[derive(Debug, Clone)]
pub struct InflightEvent {
    pub event: Event,
    raw: Bytes,
}

/// Inbound event queue adapter
pub struct EventQueue {
    rtdb: Arc<dyn Rtdb>,
    input_queue: String,
    processing_queue: String,
    block_timeout: f64,
}

impl EventQueue {
    pub fn new(rtdb: Arc<dyn Rtdb>, input_queue: impl Into<String>, block_timeout: f64) -> Self {
        let input_queue = input_queue.into();
        let processing_queue = keyspace::processing_key(&input_queue);
        Self {
            rtdb,
            input_queue,
            processing_queue,
            block_timeout,
        }
    }

    /// Drain leftover in-flight events (from a previous crash) back onto
    /// the input queue. Returns the number of recovered events.
    pub async fn recover_pending(&self) -> PulseResult<u64> {
        let mut recovered = 0u64;
        loop {
            let pending = self
                .rtdb
                .list_range(&self.processing_queue, 0, 0)
                .await
                .map_err(|e| PulseError::transport(format!("recovery read failed: {}", e)))?;
            let Some(raw) = pending.into_iter().next() else {
                break;
            };
            self.rtdb
                .list_rpush(&self.input_queue, raw.clone())
                .await
                .map_err(|e| PulseError::transport(format!("recovery requeue failed: {}", e)))?;
            self.rtdb
                .list_rem(&self.processing_queue, &raw)
                .await
                .map_err(|e| PulseError::transport(format!("recovery cleanup failed: {}", e)))?;
            recovered += 1;
        }
        if recovered > 0 {
            info!(
                "Recovered {} in-flight events from {}",
                recovered, self.processing_queue
            );
        }
        Ok(recovered)
    }

    /// Fetch the next event, blocking up to the configured timeout.
    ///
    /// Returns `Ok(None)` on timeout. A payload that fails to decode is
    /// acked and dropped with a warning (also reported as `None`): poison
    /// messages must not be redelivered forever.
    pub async fn fetch(&self) -> PulseResult<Option<InflightEvent>> {
        let raw = self
            .rtdb
            .list_blmove(&self.input_queue, &self.processing_queue, self.block_timeout)
            .await
            .map_err(|e| PulseError::transport(format!("queue fetch failed: {}", e)))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_slice::<Event>(&raw) {
            Ok(event) => {
                debug!(machine_id = %event.machine_id, "Received event");
                Ok(Some(InflightEvent { event, raw }))
            },
            Err(e) => {
                warn!(
                    "Dropping undecodable event from {}: {} ({:?})",
                    self.input_queue,
                    e,
                    String::from_utf8_lossy(&raw)
                );
                self.remove_inflight(&raw).await?;
                Ok(None)
            },
        }
    }

    /// Acknowledge a processed event, durably removing it from the queue
    pub async fn ack(&self, inflight: &InflightEvent) -> PulseResult<()> {
        self.remove_inflight(&inflight.raw).await
    }

    /// Return a failed event to the input queue for redelivery
    pub async fn requeue(&self, inflight: &InflightEvent) -> PulseResult<()> {
        self.rtdb
            .list_rpush(&self.input_queue, inflight.raw.clone())
            .await
            .map_err(|e| PulseError::transport(format!("requeue failed: {}", e)))?;
        self.remove_inflight(&inflight.raw).await
    }

    async fn remove_inflight(&self, raw: &Bytes) -> PulseResult<()> {
        let removed = self
            .rtdb
            .list_rem(&self.processing_queue, raw)
            .await
            .map_err(|e| PulseError::transport(format!("ack failed: {}", e)))?;
        if removed == 0 {
            // Already removed (e.g. by startup recovery racing a slow worker)
            warn!("In-flight event was not present in {}", self.processing_queue);
        }
        Ok(())
    }
}

/// Outbound status publisher
#[derive(Clone)]
pub struct ResultPublisher {
    rtdb: Arc<dyn Rtdb>,
    output_queue: String,
}

impl ResultPublisher {
    pub fn new(rtdb: Arc<dyn Rtdb>, output_queue: impl Into<String>) -> Self {
        Self {
            rtdb,
            output_queue: output_queue.into(),
        }
    }

    /// Push one status update to the output queue.
    ///
    /// A failure here is treated like a persistence failure by the caller:
    /// the event is requeued rather than half-applied downstream.
    pub async fn publish(&self, update: &StatusUpdate) -> PulseResult<()> {
        let json = serde_json::to_vec(update)?;
        self.rtdb
            .list_rpush(&self.output_queue, Bytes::from(json))
            .await
            .map_err(|e| PulseError::transport(format!("result publish failed: {}", e)))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use pulse_rtdb::MemoryRtdb;

    fn queue(rtdb: Arc<MemoryRtdb>) -> EventQueue {
        EventQueue::new(rtdb, "machine_data", 0.05)
    }

    async fn push_event(rtdb: &MemoryRtdb, machine_id: &str, timestamp: i64, signal: i64) {
        let event = Event {
            machine_id: machine_id.to_string(),
            timestamp,
            signal,
        };
        rtdb.list_rpush("machine_data", Bytes::from(serde_json::to_vec(&event).unwrap()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_ack_removes_everywhere() {
        let rtdb = Arc::new(MemoryRtdb::new());
        push_event(&rtdb, "m1", 100, 1).await;
        let q = queue(rtdb.clone());

        let inflight = q.fetch().await.unwrap().unwrap();
        assert_eq!(inflight.event.machine_id, "m1");
        assert_eq!(rtdb.list_len("machine_data").await.unwrap(), 0);
        assert_eq!(rtdb.list_len("machine_data:processing").await.unwrap(), 1);

        q.ack(&inflight).await.unwrap();
        assert_eq!(rtdb.list_len("machine_data:processing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_requeue_returns_event_to_input() {
        let rtdb = Arc::new(MemoryRtdb::new());
        push_event(&rtdb, "m1", 100, 1).await;
        let q = queue(rtdb.clone());

        let inflight = q.fetch().await.unwrap().unwrap();
        q.requeue(&inflight).await.unwrap();
        assert_eq!(rtdb.list_len("machine_data").await.unwrap(), 1);
        assert_eq!(rtdb.list_len("machine_data:processing").await.unwrap(), 0);

        // The requeued event is fetchable again
        let again = q.fetch().await.unwrap().unwrap();
        assert_eq!(again.event.machine_id, "m1");
    }

    #[tokio::test]
    async fn test_fetch_timeout_returns_none() {
        let rtdb = Arc::new(MemoryRtdb::new());
        let q = queue(rtdb);
        assert!(q.fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_poison_message_dropped_not_redelivered() {
        let rtdb = Arc::new(MemoryRtdb::new());
        rtdb.list_rpush("machine_data", Bytes::from("not json"))
            .await
            .unwrap();
        let q = queue(rtdb.clone());

        assert!(q.fetch().await.unwrap().is_none());
        assert_eq!(rtdb.list_len("machine_data").await.unwrap(), 0);
        assert_eq!(rtdb.list_len("machine_data:processing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recover_pending_drains_processing_list() {
        let rtdb = Arc::new(MemoryRtdb::new());
        push_event(&rtdb, "m1", 100, 1).await;
        let q = queue(rtdb.clone());

        // Simulate a crash: fetched but never acked
        let _inflight = q.fetch().await.unwrap().unwrap();
        assert_eq!(rtdb.list_len("machine_data:processing").await.unwrap(), 1);

        let recovered = q.recover_pending().await.unwrap();
        assert_eq!(recovered, 1);
        assert_eq!(rtdb.list_len("machine_data").await.unwrap(), 1);
        assert_eq!(rtdb.list_len("machine_data:processing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_publisher_pushes_json() {
        let rtdb = Arc::new(MemoryRtdb::new());
        let publisher = ResultPublisher::new(rtdb.clone(), "machine_status");
        let update = StatusUpdate {
            machine_id: "m1".to_string(),
            signal: Some(1),
            timestamp: Some(150),
            status: "running".to_string(),
        };
        publisher.publish(&update).await.unwrap();

        let raw = rtdb.list_range("machine_status", 0, -1).await.unwrap();
        assert_eq!(raw.len(), 1);
        let back: StatusUpdate = serde_json::from_slice(&raw[0]).unwrap();
        assert_eq!(back, update);
    }
}
