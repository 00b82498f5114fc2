//! StateRepository - the authoritative machine-state store
//!
//! One JSON record per machine at `state:{machine_id}`, no TTL. A `put` is a
//! single-key SET, atomic per id on the Redis side; serialization of
//! concurrent writers for the same id is the dispatcher's job. Failures are
//! reported to the caller and never retried here.

use crate::keyspace;
use crate::traits::Rtdb;
use bytes::Bytes;
use errors::{PulseError, PulseResult};
use pulse_model::MachineState;
use std::sync::Arc;

/// Durable key-value store of each machine's last known state
#[derive(Clone)]
pub struct StateRepository {
    rtdb: Arc<dyn Rtdb>,
}

impl StateRepository {
    pub fn new(rtdb: Arc<dyn Rtdb>) -> Self {
        Self { rtdb }
    }

    /// Load the last stored record for a machine, or `None` on first contact
    pub async fn get(&self, machine_id: &str) -> PulseResult<Option<MachineState>> {
        let key = keyspace::state_key(machine_id);
        let raw = self
            .rtdb
            .get(&key)
            .await
            .map_err(|e| PulseError::StatePersistence {
                machine_id: machine_id.to_string(),
                reason: format!("read failed: {}", e),
            })?;

        match raw {
            Some(bytes) => {
                let state: MachineState = serde_json::from_slice(&bytes).map_err(|e| {
                    PulseError::StatePersistence {
                        machine_id: machine_id.to_string(),
                        reason: format!("stored record is not valid JSON: {}", e),
                    }
                })?;
                Ok(Some(state))
            },
            None => Ok(None),
        }
    }

    /// Overwrite the single record for a machine
    pub async fn put(&self, machine_id: &str, state: &MachineState) -> PulseResult<()> {
        let key = keyspace::state_key(machine_id);
        let json = serde_json::to_vec(state)?;
        self.rtdb
            .set(&key, Bytes::from(json))
            .await
            .map_err(|e| PulseError::StatePersistence {
                machine_id: machine_id.to_string(),
                reason: format!("write failed: {}", e),
            })
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use crate::memory_impl::MemoryRtdb;

    fn repo() -> StateRepository {
        StateRepository::new(Arc::new(MemoryRtdb::new()))
    }

    #[tokio::test]
    async fn test_get_absent_returns_none() {
        let repo = repo();
        assert_eq!(repo.get("m1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() {
        let repo = repo();
        let state = MachineState {
            signal: Some(1),
            timestamp: Some(150),
            status: "running".to_string(),
        };
        repo.put("m1", &state).await.unwrap();
        assert_eq!(repo.get("m1").await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_put_overwrites_single_record() {
        let repo = repo();
        let first = MachineState {
            signal: Some(0),
            timestamp: Some(100),
            status: "stopped".to_string(),
        };
        let second = MachineState {
            signal: Some(1),
            timestamp: Some(150),
            status: "running".to_string(),
        };
        repo.put("m1", &first).await.unwrap();
        repo.put("m1", &second).await.unwrap();
        assert_eq!(repo.get("m1").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_corrupt_record_reported_as_persistence_failure() {
        let rtdb = Arc::new(MemoryRtdb::new());
        rtdb.set("state:m1", Bytes::from("not json")).await.unwrap();
        let repo = StateRepository::new(rtdb);
        let err = repo.get("m1").await.unwrap_err();
        assert!(matches!(err, PulseError::StatePersistence { .. }));
    }
}
