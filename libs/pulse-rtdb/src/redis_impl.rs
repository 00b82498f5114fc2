//! Redis implementation of the Rtdb trait

use crate::traits::Rtdb;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use common::redis::RedisClient;
use std::sync::Arc;

/// Redis-backed RTDB implementation
///
/// This is a pure storage abstraction over the pooled `common` client; the
/// engine's semantics (state records, rule cache, reliable queues) live in
/// the callers.
pub struct RedisRtdb {
    client: Arc<RedisClient>,
}

impl RedisRtdb {
    /// Create new Redis RTDB from URL
    pub async fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: Arc::new(RedisClient::new(url).await?),
        })
    }

    /// Create from existing RedisClient
    pub fn from_client(client: Arc<RedisClient>) -> Self {
        Self { client }
    }

    /// Get reference to underlying Redis client
    ///
    /// This is useful for calling Redis commands directly
    /// that are not part of the Rtdb trait.
    pub fn client(&self) -> &Arc<RedisClient> {
        &self.client
    }
}

#[async_trait]
impl Rtdb for RedisRtdb {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        let value: Option<String> = self.client.get(key).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        let s = String::from_utf8(value.to_vec()).context("UTF-8 conversion failed")?;
        self.client.set(key, s).await
    }

    async fn set_ex(&self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<()> {
        let s = String::from_utf8(value.to_vec()).context("UTF-8 conversion failed")?;
        self.client.set_ex(key, s, ttl_seconds).await
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let count = self.client.del(key).await?;
        Ok(count > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.client.exists(key).await
    }

    async fn list_lpush(&self, key: &str, value: Bytes) -> Result<()> {
        let s = String::from_utf8(value.to_vec()).context("UTF-8 conversion failed")?;
        self.client.lpush(key, s).await.map(|_| ())
    }

    async fn list_rpush(&self, key: &str, value: Bytes) -> Result<()> {
        let s = String::from_utf8(value.to_vec()).context("UTF-8 conversion failed")?;
        self.client.rpush(key, &s).await.map(|_| ())
    }

    async fn list_blmove(
        &self,
        source: &str,
        destination: &str,
        timeout_seconds: f64,
    ) -> Result<Option<Bytes>> {
        let value = self
            .client
            .blmove(source, destination, timeout_seconds)
            .await?;
        Ok(value.map(Bytes::from))
    }

    async fn list_rem(&self, key: &str, value: &Bytes) -> Result<u32> {
        let s = String::from_utf8(value.to_vec()).context("UTF-8 conversion failed")?;
        self.client.lrem(key, 1, &s).await
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        self.client.llen(key).await
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<Bytes>> {
        let values: Vec<String> = self.client.lrange(key, start, stop).await?;
        Ok(values.into_iter().map(Bytes::from).collect())
    }

    async fn publish(&self, channel: &str, message: &str) -> Result<u32> {
        self.client.publish(channel, message).await
    }

    async fn time_millis(&self) -> Result<i64> {
        self.client.time_millis().await
    }
}
