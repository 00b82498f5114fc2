//! Inbound event type

use serde::{Deserialize, Serialize};

/// One observation from a machine.
///
/// Wire format on the inbound queue (JSON):
/// `{"machine_id": "machine_A", "timestamp": 1712345678, "signal": 1}`
///
/// Timestamps are opaque integer seconds; they track physical time per
/// machine but arrival order is not guaranteed to match timestamp order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque non-empty machine identifier
    pub machine_id: String,
    /// Observation time in seconds
    pub timestamp: i64,
    /// Raw observed value (small discrete domain, e.g. 0/1)
    pub signal: i64,
}

impl Event {
    /// Validate the minimal wire contract
    pub fn validate(&self) -> Result<(), String> {
        if self.machine_id.is_empty() {
            return Err("machine_id must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_roundtrip() {
        let json = r#"{"machine_id":"machine_A","timestamp":150,"signal":1}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.machine_id, "machine_A");
        assert_eq!(event.timestamp, 150);
        assert_eq!(event.signal, 1);
    }

    #[test]
    fn test_empty_machine_id_rejected() {
        let event = Event {
            machine_id: String::new(),
            timestamp: 0,
            signal: 0,
        };
        assert!(event.validate().is_err());
    }
}
