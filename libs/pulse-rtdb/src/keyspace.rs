//! Redis key naming conventions
//!
//! Two families of keys share one keyspace:
//! - `state:{machine_id}` - authoritative machine state, JSON, no TTL
//! - `rule:{machine_id}` - cached rule text, TTL'd
//!
//! Queue names follow the original wire contract: events arrive on
//! `machine_data`, status updates leave on `machine_status`. Each inbound
//! queue has a companion `{queue}:processing` list holding in-flight events
//! until they are acked.

/// Default inbound event queue
pub const INPUT_QUEUE: &str = "machine_data";

/// Default outbound status queue
pub const OUTPUT_QUEUE: &str = "machine_status";

/// Key of the authoritative state record for a machine
pub fn state_key(machine_id: &str) -> String {
    format!("state:{}", machine_id)
}

/// Key of the TTL'd rule cache entry for a machine
pub fn rule_key(machine_id: &str) -> String {
    format!("rule:{}", machine_id)
}

/// Companion processing list for an inbound queue
pub fn processing_key(queue: &str) -> String {
    format!("{}:processing", queue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        assert_eq!(state_key("machine_A"), "state:machine_A");
        assert_eq!(rule_key("machine_A"), "rule:machine_A");
        assert_eq!(processing_key("machine_data"), "machine_data:processing");
    }
}
