//! In-memory RTDB implementation
//!
//! Uses DashMap for lock-free concurrent access. Used in tests and embedded
//! scenarios; TTLs are honored lazily on read and BLMOVE is emulated by
//! polling.

use crate::traits::Rtdb;
use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Poll interval for the emulated blocking move
const BLMOVE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// In-memory RTDB implementation with concurrent access support
pub struct MemoryRtdb {
    kv_store: Arc<DashMap<String, (Bytes, Option<Instant>)>>,
    list_store: Arc<DashMap<String, Mutex<VecDeque<Bytes>>>>,
}

impl MemoryRtdb {
    /// Create new in-memory RTDB instance
    pub fn new() -> Self {
        Self {
            kv_store: Arc::new(DashMap::new()),
            list_store: Arc::new(DashMap::new()),
        }
    }

    /// Force-expire a key immediately (useful for TTL tests)
    pub fn expire_now(&self, key: &str) {
        if let Some(mut entry) = self.kv_store.get_mut(key) {
            entry.1 = Some(Instant::now() - Duration::from_secs(1));
        }
    }

    /// Read a key honoring its expiry, removing it when stale
    fn get_live(&self, key: &str) -> Option<Bytes> {
        let expired = match self.kv_store.get(key) {
            Some(entry) => match entry.1 {
                Some(deadline) => deadline <= Instant::now(),
                None => false,
            },
            None => return None,
        };

        if expired {
            self.kv_store.remove(key);
            return None;
        }
        self.kv_store.get(key).map(|entry| entry.0.clone())
    }

    /// Try to move one value from the head of `source` to the tail of
    /// `destination` without blocking
    fn try_move(&self, source: &str, destination: &str) -> Option<Bytes> {
        let value = {
            let list = self.list_store.get(source)?;
            let mut guard = list.lock();
            guard.pop_front()
        }?;

        self.list_store
            .entry(destination.to_string())
            .or_default()
            .lock()
            .push_back(value.clone());
        Some(value)
    }
}

impl Default for MemoryRtdb {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Rtdb for MemoryRtdb {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.get_live(key))
    }

    async fn set(&self, key: &str, value: Bytes) -> Result<()> {
        self.kv_store.insert(key.to_string(), (value, None));
        Ok(())
    }

    async fn set_ex(&self, key: &str, value: Bytes, ttl_seconds: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_seconds);
        self.kv_store
            .insert(key.to_string(), (value, Some(deadline)));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        Ok(self.kv_store.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get_live(key).is_some())
    }

    async fn list_lpush(&self, key: &str, value: Bytes) -> Result<()> {
        self.list_store
            .entry(key.to_string())
            .or_default()
            .lock()
            .push_front(value);
        Ok(())
    }

    async fn list_rpush(&self, key: &str, value: Bytes) -> Result<()> {
        self.list_store
            .entry(key.to_string())
            .or_default()
            .lock()
            .push_back(value);
        Ok(())
    }

    async fn list_blmove(
        &self,
        source: &str,
        destination: &str,
        timeout_seconds: f64,
    ) -> Result<Option<Bytes>> {
        let deadline = Instant::now() + Duration::from_secs_f64(timeout_seconds.max(0.0));
        loop {
            if let Some(value) = self.try_move(source, destination) {
                return Ok(Some(value));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(BLMOVE_POLL_INTERVAL).await;
        }
    }

    async fn list_rem(&self, key: &str, value: &Bytes) -> Result<u32> {
        let Some(list) = self.list_store.get(key) else {
            return Ok(0);
        };
        let mut guard = list.lock();
        if let Some(pos) = guard.iter().position(|v| v == value) {
            guard.remove(pos);
            Ok(1)
        } else {
            Ok(0)
        }
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        Ok(self
            .list_store
            .get(key)
            .map(|list| list.lock().len() as u64)
            .unwrap_or(0))
    }

    async fn list_range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<Bytes>> {
        let Some(list) = self.list_store.get(key) else {
            return Ok(Vec::new());
        };
        let guard = list.lock();
        let len = guard.len() as isize;
        if len == 0 {
            return Ok(Vec::new());
        }
        // LRANGE semantics: negative indexes count from the tail, a start
        // past the end yields an empty range, stop is clamped to the end
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start >= len || stop < start {
            return Ok(Vec::new());
        }
        Ok(guard
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .cloned()
            .collect())
    }

    async fn publish(&self, _channel: &str, _message: &str) -> Result<u32> {
        // No subscribers in the in-memory backend
        Ok(0)
    }

    async fn time_millis(&self) -> Result<i64> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?;
        Ok(now.as_millis() as i64)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_kv_set_get_del() {
        let rtdb = MemoryRtdb::new();
        rtdb.set("k", Bytes::from("v")).await.unwrap();
        assert_eq!(rtdb.get("k").await.unwrap(), Some(Bytes::from("v")));
        assert!(rtdb.del("k").await.unwrap());
        assert_eq!(rtdb.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_ex_expires() {
        let rtdb = MemoryRtdb::new();
        rtdb.set_ex("k", Bytes::from("v"), 300).await.unwrap();
        assert!(rtdb.exists("k").await.unwrap());
        rtdb.expire_now("k");
        assert!(!rtdb.exists("k").await.unwrap());
        assert_eq!(rtdb.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blmove_moves_to_processing() {
        let rtdb = MemoryRtdb::new();
        rtdb.list_rpush("in", Bytes::from("a")).await.unwrap();
        let moved = rtdb.list_blmove("in", "in:processing", 0.1).await.unwrap();
        assert_eq!(moved, Some(Bytes::from("a")));
        assert_eq!(rtdb.list_len("in").await.unwrap(), 0);
        assert_eq!(rtdb.list_len("in:processing").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_blmove_times_out_empty() {
        let rtdb = MemoryRtdb::new();
        let moved = rtdb.list_blmove("in", "in:processing", 0.05).await.unwrap();
        assert_eq!(moved, None);
    }

    #[tokio::test]
    async fn test_list_rem_removes_single_occurrence() {
        let rtdb = MemoryRtdb::new();
        rtdb.list_rpush("l", Bytes::from("x")).await.unwrap();
        rtdb.list_rpush("l", Bytes::from("x")).await.unwrap();
        assert_eq!(rtdb.list_rem("l", &Bytes::from("x")).await.unwrap(), 1);
        assert_eq!(rtdb.list_len("l").await.unwrap(), 1);
        assert_eq!(rtdb.list_rem("l", &Bytes::from("y")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_range() {
        let rtdb = MemoryRtdb::new();
        for v in ["a", "b", "c"] {
            rtdb.list_rpush("l", Bytes::from(v)).await.unwrap();
        }
        let all = rtdb.list_range("l", 0, -1).await.unwrap();
        assert_eq!(all, vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]);
        let middle = rtdb.list_range("l", 1, 1).await.unwrap();
        assert_eq!(middle, vec![Bytes::from("b")]);
        let clamped = rtdb.list_range("l", 1, 10).await.unwrap();
        assert_eq!(clamped, vec![Bytes::from("b"), Bytes::from("c")]);
    }

    #[tokio::test]
    async fn test_list_range_start_past_end_is_empty() {
        let rtdb = MemoryRtdb::new();
        for v in ["a", "b", "c"] {
            rtdb.list_rpush("l", Bytes::from(v)).await.unwrap();
        }
        assert!(rtdb.list_range("l", 5, 10).await.unwrap().is_empty());
        assert!(rtdb.list_range("l", 3, 3).await.unwrap().is_empty());
        assert!(rtdb.list_range("l", -10, -4).await.unwrap().is_empty());
    }
}
