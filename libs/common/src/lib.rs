//! MachinePulse basic library
//!
//! Provides basic functions shared by all services, including:
//! - Redis client with connection pooling
//! - logging initialization
//! - graceful shutdown helpers
//! - bounded retry with backoff

pub mod logging;
pub mod redis;
pub mod retry;
pub mod shutdown;

pub use redis::{RedisClient, RedisConfig};
pub use retry::{retry_with_backoff, RetryError, RetryPolicy};
