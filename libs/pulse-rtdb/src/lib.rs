//! MachinePulse Realtime Database Abstraction
//!
//! Provides a unified interface for realtime data storage,
//! supporting multiple backends (Redis, in-memory).
//!
//! # Key Components
//!
//! - **Rtdb trait**: key-value + list-queue operations used by the engine
//! - **RedisRtdb**: production backend over the pooled `common` client
//! - **MemoryRtdb**: in-memory backend for tests
//! - **StateRepository**: the authoritative machine-state store
//! - **keyspace**: Redis key naming conventions

pub mod keyspace;
pub mod memory_impl;
pub mod redis_impl;
pub mod state;
pub mod traits;

// Re-exports
pub use bytes::Bytes;
pub use memory_impl::MemoryRtdb;
pub use redis_impl::RedisRtdb;
pub use state::StateRepository;
pub use traits::Rtdb;

/// Helper functions for common operations
pub mod helpers {
    use super::{MemoryRtdb, Rtdb};
    use std::sync::Arc;

    /// Create an in-memory RTDB for unit testing
    ///
    /// This creates a MemoryRtdb that doesn't require any external services.
    /// Suitable for unit tests that should not depend on Redis.
    pub fn create_test_rtdb() -> Arc<dyn Rtdb> {
        Arc::new(MemoryRtdb::new())
    }

    /// Create a concrete MemoryRtdb for unit testing
    ///
    /// Use this when you need direct access to MemoryRtdb methods
    /// (e.g., for inspecting internal state in tests).
    pub fn create_test_memory_rtdb() -> Arc<MemoryRtdb> {
        Arc::new(MemoryRtdb::new())
    }
}
