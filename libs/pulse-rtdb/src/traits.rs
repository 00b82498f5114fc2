//! Trait definitions for RTDB abstraction

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::any::Any;

/// Unified RTDB Storage Trait
///
/// Provides the storage interface MachinePulse needs:
/// - Basic key-value operations (machine state records)
/// - TTL'd key-value operations (rule cache)
/// - List operations (durable event/result queues)
/// - Pub/sub style publish (fire-and-forget notifications)
///
/// Implementations:
/// - `RedisRtdb`: Production Redis backend
/// - `MemoryRtdb`: In-memory backend for testing
#[async_trait]
pub trait Rtdb: Send + Sync + 'static {
    // ========== Introspection ==========

    /// Allow downcasting to concrete types
    fn as_any(&self) -> &dyn Any;

    // ========== Basic Key-Value Operations ==========

    /// Get value by key
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Set value for key
    async fn set(&self, key: &str, value: Bytes) -> Result<()>;

    /// Set value for key with an expiry in seconds (Redis SETEX)
    async fn set_ex(&self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<()>;

    /// Delete key
    async fn del(&self, key: &str) -> Result<bool>;

    /// Check if key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    // ========== List Operations ==========

    /// Push value to left of list
    async fn list_lpush(&self, key: &str, value: Bytes) -> Result<()>;

    /// Push value to right of list
    async fn list_rpush(&self, key: &str, value: Bytes) -> Result<()>;

    /// Block until a value can be moved from the head of `source` to the
    /// tail of `destination`, or until the timeout expires (Redis BLMOVE)
    ///
    /// This is the fetch half of the reliable-queue pattern: the value stays
    /// visible in `destination` until explicitly removed, so a crashed
    /// consumer leaves its in-flight work recoverable.
    ///
    /// # Arguments
    /// * `source` - queue to consume from
    /// * `destination` - processing list holding in-flight values
    /// * `timeout_seconds` - block timeout (fractional seconds allowed)
    ///
    /// # Returns
    /// * `Some(value)` - the moved value
    /// * `None` - timeout expired without data
    async fn list_blmove(
        &self,
        source: &str,
        destination: &str,
        timeout_seconds: f64,
    ) -> Result<Option<Bytes>>;

    /// Remove occurrences of `value` from a list (Redis LREM)
    ///
    /// Returns the number of removed elements. This is the ack half of the
    /// reliable-queue pattern.
    async fn list_rem(&self, key: &str, value: &Bytes) -> Result<u32>;

    /// Get list length
    async fn list_len(&self, key: &str) -> Result<u64>;

    /// Get list range
    async fn list_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<Bytes>>;

    // ========== Messaging Operations ==========

    /// Publish message to channel (Redis Pub/Sub)
    ///
    /// Returns the number of subscribers that received the message.
    /// In test implementations (MemoryRtdb), this may return 0.
    async fn publish(&self, channel: &str, message: &str) -> Result<u32>;

    // ========== Time Operations ==========

    /// Get current server time in milliseconds (Redis TIME)
    async fn time_millis(&self) -> Result<i64>;
}
