//! Machine state record and the timestamp-freeze invariant

use crate::event::Event;
use crate::status::Derived;
use serde::{Deserialize, Serialize};

/// The single authoritative record per machine.
///
/// `signal` is the last observed raw signal. `timestamp` is the time at
/// which the signal last *changed*, not the last event time. `status` is the
/// rule-derived classification and always reflects the latest rule output.
///
/// Stored as JSON at `state:{machine_id}` with no TTL, overwritten whole on
/// every processed event, never deleted by the engine. `signal` and
/// `timestamp` are `None` only in the absent-state placeholder used before a
/// machine's first event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineState {
    pub signal: Option<i64>,
    pub timestamp: Option<i64>,
    pub status: String,
}

impl MachineState {
    /// The semantic default for a machine that has never been seen
    pub fn absent() -> Self {
        Self {
            signal: None,
            timestamp: None,
            status: String::new(),
        }
    }

    /// Apply one event and its derived status to this (prior) state,
    /// producing the new state.
    ///
    /// Timestamp-freeze invariant: the timestamp advances to the event's
    /// timestamp only when the signal differs from the prior signal. An
    /// unchanged signal carries the prior timestamp forward even though the
    /// event is newer. A prior of `None` (first-ever event) always takes the
    /// event's timestamp.
    pub fn apply(&self, event: &Event, derived: Derived) -> MachineState {
        let timestamp = match (self.signal, self.timestamp) {
            (Some(prior_signal), Some(prior_ts)) if prior_signal == event.signal => prior_ts,
            _ => event.timestamp,
        };

        MachineState {
            signal: Some(event.signal),
            timestamp: Some(timestamp),
            status: derived.status,
        }
    }
}

/// The record emitted downstream after processing one event.
///
/// Wire format on the outbound queue (JSON):
/// `{"machine_id": "machine_A", "signal": 1, "timestamp": 150, "status": "running"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub machine_id: String,
    pub signal: Option<i64>,
    pub timestamp: Option<i64>,
    pub status: String,
}

impl StatusUpdate {
    pub fn from_state(machine_id: impl Into<String>, state: &MachineState) -> Self {
        Self {
            machine_id: machine_id.into(),
            signal: state.signal,
            timestamp: state.timestamp,
            status: state.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(timestamp: i64, signal: i64) -> Event {
        Event {
            machine_id: "m1".to_string(),
            timestamp,
            signal,
        }
    }

    #[test]
    fn test_timestamp_frozen_when_signal_unchanged() {
        let prior = MachineState {
            signal: Some(0),
            timestamp: Some(100),
            status: "stopped".to_string(),
        };
        let new = prior.apply(&event(150, 0), Derived::new("stopped"));
        assert_eq!(new.signal, Some(0));
        assert_eq!(new.timestamp, Some(100));
        assert_eq!(new.status, "stopped");
    }

    #[test]
    fn test_timestamp_advances_when_signal_changes() {
        let prior = MachineState {
            signal: Some(0),
            timestamp: Some(100),
            status: "stopped".to_string(),
        };
        let new = prior.apply(&event(150, 1), Derived::new("running"));
        assert_eq!(new.signal, Some(1));
        assert_eq!(new.timestamp, Some(150));
        assert_eq!(new.status, "running");
    }

    #[test]
    fn test_first_event_always_takes_event_timestamp() {
        let new = MachineState::absent().apply(&event(10, 1), Derived::unknown());
        assert_eq!(new.signal, Some(1));
        assert_eq!(new.timestamp, Some(10));
        assert_eq!(new.status, "unknown");
    }

    #[test]
    fn test_status_updates_even_when_timestamp_frozen() {
        let prior = MachineState {
            signal: Some(1),
            timestamp: Some(100),
            status: "running".to_string(),
        };
        // Same signal, different rule output: status follows the rule,
        // timestamp stays frozen.
        let new = prior.apply(&event(200, 1), Derived::error());
        assert_eq!(new.timestamp, Some(100));
        assert_eq!(new.status, "error");
    }

    #[test]
    fn test_apply_is_idempotent() {
        let prior = MachineState {
            signal: Some(0),
            timestamp: Some(100),
            status: "stopped".to_string(),
        };
        let e = event(150, 1);
        let first = prior.apply(&e, Derived::new("running"));
        let second = prior.apply(&e, Derived::new("running"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_state_json_roundtrip() {
        let state = MachineState {
            signal: Some(1),
            timestamp: Some(150),
            status: "running".to_string(),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: MachineState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
