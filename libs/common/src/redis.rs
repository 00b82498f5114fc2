//! Redis client module with connection pooling
//!
//! Provides minimal async Redis client with only the methods actually used

use anyhow::{Context, Result};
use bb8::{Pool, PooledConnection};
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;

/// Redis connection pool configuration
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of idle connections
    pub min_idle: Option<u32>,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
    /// Maximum lifetime of a connection in seconds
    pub max_lifetime: Option<u64>,
    /// Idle timeout in seconds
    pub idle_timeout: Option<u64>,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            max_connections: 50,
            min_idle: Some(10),
            connection_timeout: 5,
            max_lifetime: Some(3600), // 1 hour
            idle_timeout: Some(600),  // 10 minutes
        }
    }
}

impl RedisConfig {
    /// Create config from URL with default pool settings
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Redis asynchronous client with connection pooling
pub struct RedisClient {
    pool: Arc<Pool<RedisConnectionManager>>,
    url: String,
}

impl std::fmt::Debug for RedisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisClient")
            .field("url", &self.url)
            .field("pool_state", &self.pool.state())
            .finish()
    }
}

impl RedisClient {
    /// Create a new client with default configuration
    pub async fn new(url: &str) -> Result<Self> {
        Self::with_config(RedisConfig::from_url(url)).await
    }

    /// Create a new client with custom configuration
    pub async fn with_config(config: RedisConfig) -> Result<Self> {
        let pool = Self::build_pool(&config).await?;

        // Test the connection
        {
            let mut conn = pool
                .get()
                .await
                .context("Failed to get connection from pool for testing")?;
            let _: String = redis::cmd("PING")
                .query_async(&mut *conn)
                .await
                .context("Failed to ping Redis server")?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            url: config.url,
        })
    }

    async fn build_pool(config: &RedisConfig) -> Result<Pool<RedisConnectionManager>> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .context("Failed to create Redis connection manager")?;

        let mut pool_builder = Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.connection_timeout));

        if let Some(min_idle) = config.min_idle {
            pool_builder = pool_builder.min_idle(Some(min_idle));
        }

        if let Some(max_lifetime) = config.max_lifetime {
            pool_builder = pool_builder.max_lifetime(Some(Duration::from_secs(max_lifetime)));
        }

        if let Some(idle_timeout) = config.idle_timeout {
            pool_builder = pool_builder.idle_timeout(Some(Duration::from_secs(idle_timeout)));
        }

        pool_builder
            .build(manager)
            .await
            .context("Failed to build Redis connection pool")
    }

    /// Get a connection from the pool
    ///
    /// This is useful for calling Redis commands or other operations
    /// not provided by the RedisClient API.
    pub async fn get_connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        self.pool
            .get()
            .await
            .context("Failed to get connection from pool")
    }

    /// GET operation
    pub async fn get<T: redis::FromRedisValue>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.get_connection().await?;
        conn.get(key)
            .await
            .with_context(|| format!("Failed to GET key: {}", key))
    }

    /// SET operation
    pub async fn set<T: redis::ToRedisArgs + Send + Sync>(
        &self,
        key: &str,
        value: T,
    ) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.set(key, value)
            .await
            .with_context(|| format!("Failed to SET key: {}", key))
    }

    /// SETEX operation - set value with expiry in seconds
    pub async fn set_ex<T: redis::ToRedisArgs + Send + Sync>(
        &self,
        key: &str,
        value: T,
        ttl_seconds: u64,
    ) -> Result<()> {
        let mut conn = self.get_connection().await?;
        conn.set_ex(key, value, ttl_seconds)
            .await
            .with_context(|| format!("Failed to SETEX key: {}", key))
    }

    /// DEL operation
    pub async fn del(&self, key: &str) -> Result<u32> {
        let mut conn = self.get_connection().await?;
        conn.del(key)
            .await
            .with_context(|| format!("Failed to DEL key: {}", key))
    }

    /// EXISTS operation
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        conn.exists(key)
            .await
            .with_context(|| format!("Failed to check EXISTS for key: {}", key))
    }

    /// PUBLISH operation
    pub async fn publish(&self, channel: &str, message: &str) -> Result<u32> {
        let mut conn = self.get_connection().await?;
        conn.publish(channel, message)
            .await
            .with_context(|| format!("Failed to PUBLISH to channel: {}", channel))
    }

    /// PING operation - test connection
    pub async fn ping(&self) -> Result<String> {
        let mut conn = self.get_connection().await?;
        redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .context("Failed to PING Redis server")
    }

    /// BLMOVE operation - blocking atomic move between lists
    ///
    /// Pops from the left of `source` and pushes to the right of `destination`,
    /// blocking up to `timeout` seconds. Returns the moved value, or None on timeout.
    pub async fn blmove(
        &self,
        source: &str,
        destination: &str,
        timeout_seconds: f64,
    ) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        redis::cmd("BLMOVE")
            .arg(source)
            .arg(destination)
            .arg("LEFT")
            .arg("RIGHT")
            .arg(timeout_seconds)
            .query_async(&mut *conn)
            .await
            .with_context(|| format!("Failed to BLMOVE from {} to {}", source, destination))
    }

    /// LREM operation - remove occurrences of value from a list
    ///
    /// Returns the number of removed elements.
    pub async fn lrem(&self, key: &str, count: isize, value: &str) -> Result<u32> {
        let mut conn = self.get_connection().await?;
        redis::cmd("LREM")
            .arg(key)
            .arg(count)
            .arg(value)
            .query_async(&mut *conn)
            .await
            .with_context(|| format!("Failed to LREM from key: {}", key))
    }

    /// RPUSH operation - add element to list tail
    pub async fn rpush(&self, key: &str, value: &str) -> Result<u32> {
        let mut conn = self.get_connection().await?;
        conn.rpush(key, value)
            .await
            .with_context(|| format!("Failed to RPUSH to key: {}", key))
    }

    /// LPUSH operation - add element to list head
    pub async fn lpush<T: redis::ToRedisArgs + Send + Sync>(
        &self,
        key: &str,
        value: T,
    ) -> Result<u32> {
        let mut conn = self.get_connection().await?;
        conn.lpush(key, value)
            .await
            .with_context(|| format!("Failed to LPUSH to key: {}", key))
    }

    /// LLEN operation - list length
    pub async fn llen(&self, key: &str) -> Result<u64> {
        let mut conn = self.get_connection().await?;
        conn.llen(key)
            .await
            .with_context(|| format!("Failed to LLEN key: {}", key))
    }

    /// LRANGE operation - get list elements in range
    pub async fn lrange<T: redis::FromRedisValue>(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<T>> {
        let mut conn = self.get_connection().await?;
        redis::cmd("LRANGE")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut *conn)
            .await
            .with_context(|| format!("Failed to LRANGE key: {}", key))
    }

    /// Return Redis server time in milliseconds
    pub async fn time_millis(&self) -> Result<i64> {
        let mut conn = self.get_connection().await?;
        let (seconds, microseconds): (i64, i64) = redis::cmd("TIME")
            .query_async(&mut *conn)
            .await
            .with_context(|| "Failed to fetch Redis TIME command")?;
        Ok(seconds
            .saturating_mul(1000)
            .saturating_add(microseconds / 1000))
    }
}
