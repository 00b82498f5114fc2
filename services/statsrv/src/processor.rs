//! EventProcessor - the per-event pipeline
//!
//! For one event: validate, load the prior state, resolve the machine's
//! rule, evaluate it, apply the timestamp-freeze transition, persist the
//! new state, publish the resulting status update. Rule problems never
//! surface as errors here (the resolver and evaluator degrade to the
//! error status internally); only persistence and publish failures do,
//! and those make the caller requeue the event.

use crate::transport::ResultPublisher;
use errors::{PulseError, PulseResult};
use pulse_model::{Event, MachineState, StatusUpdate};
use pulse_rtdb::StateRepository;
use pulse_rules::{RuleEvaluator, RuleResolver};
use std::sync::Arc;
use tracing::debug;

pub struct EventProcessor {
    states: StateRepository,
    rules: Arc<dyn RuleResolver>,
    evaluator: RuleEvaluator,
    publisher: ResultPublisher,
}

impl EventProcessor {
    pub fn new(
        states: StateRepository,
        rules: Arc<dyn RuleResolver>,
        publisher: ResultPublisher,
    ) -> Self {
        Self {
            states,
            rules,
            evaluator: RuleEvaluator::new(),
            publisher,
        }
    }

    /// Process one event end to end.
    ///
    /// The caller must hold the per-machine lock for `event.machine_id`
    /// across this call: the get-apply-put sequence is not atomic on its
    /// own, and interleaved events for one machine would race on state.
    pub async fn process(&self, event: &Event) -> PulseResult<StatusUpdate> {
        event.validate().map_err(PulseError::InvalidData)?;

        let prior = self
            .states
            .get(&event.machine_id)
            .await?
            .unwrap_or_else(MachineState::absent);

        let rule = self.rules.resolve(&event.machine_id).await;
        let derived = self.evaluator.evaluate(&rule, event, &prior);
        let state = prior.apply(event, derived);

        self.states.put(&event.machine_id, &state).await?;

        let update = StatusUpdate::from_state(&event.machine_id, &state);
        self.publisher.publish(&update).await?;

        debug!(
            machine_id = %event.machine_id,
            signal = event.signal,
            status = %update.status,
            "Processed event"
        );
        Ok(update)
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulse_rtdb::{MemoryRtdb, Rtdb};
    use pulse_rules::Rule;

    /// Resolver stub returning a fixed rule for every machine
    struct FixedRule(Rule);

    #[async_trait]
    impl RuleResolver for FixedRule {
        async fn resolve(&self, _machine_id: &str) -> Rule {
            self.0.clone()
        }
    }

    fn processor(rtdb: Arc<MemoryRtdb>, rule: Rule) -> EventProcessor {
        EventProcessor::new(
            StateRepository::new(rtdb.clone()),
            Arc::new(FixedRule(rule)),
            ResultPublisher::new(rtdb, "machine_status"),
        )
    }

    fn event(machine_id: &str, timestamp: i64, signal: i64) -> Event {
        Event {
            machine_id: machine_id.to_string(),
            timestamp,
            signal,
        }
    }

    fn signal_rule() -> Rule {
        Rule::parse(r#"if(signal == 1, "running", "stopped")"#).unwrap()
    }

    async fn published(rtdb: &MemoryRtdb) -> Vec<StatusUpdate> {
        rtdb.list_range("machine_status", 0, -1)
            .await
            .unwrap()
            .iter()
            .map(|b| serde_json::from_slice(b).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_first_event_creates_state_and_publishes() {
        let rtdb = Arc::new(MemoryRtdb::new());
        let p = processor(rtdb.clone(), signal_rule());

        let update = p.process(&event("machine_A", 100, 1)).await.unwrap();
        assert_eq!(update.status, "running");
        assert_eq!(update.timestamp, Some(100));

        let stored = StateRepository::new(rtdb.clone())
            .get("machine_A")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.signal, Some(1));
        assert_eq!(stored.timestamp, Some(100));
        assert_eq!(published(&rtdb).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_signal_freezes_timestamp() {
        let rtdb = Arc::new(MemoryRtdb::new());
        let p = processor(rtdb.clone(), signal_rule());

        p.process(&event("machine_A", 100, 1)).await.unwrap();
        let update = p.process(&event("machine_A", 150, 1)).await.unwrap();
        assert_eq!(update.timestamp, Some(100));
        assert_eq!(update.status, "running");

        let update = p.process(&event("machine_A", 200, 0)).await.unwrap();
        assert_eq!(update.timestamp, Some(200));
        assert_eq!(update.status, "stopped");
    }

    #[tokio::test]
    async fn test_default_rule_yields_unknown() {
        let rtdb = Arc::new(MemoryRtdb::new());
        let p = processor(rtdb.clone(), Rule::Default);

        let update = p.process(&event("machine_A", 100, 1)).await.unwrap();
        assert_eq!(update.status, "unknown");
    }

    #[tokio::test]
    async fn test_fallback_rule_yields_error_but_still_publishes() {
        let rtdb = Arc::new(MemoryRtdb::new());
        let p = processor(rtdb.clone(), Rule::Fallback);

        let update = p.process(&event("machine_A", 100, 1)).await.unwrap();
        assert_eq!(update.status, "error");
        // State commits and the update goes out even on the error path
        assert_eq!(published(&rtdb).await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_event_rejected_before_any_effect() {
        let rtdb = Arc::new(MemoryRtdb::new());
        let p = processor(rtdb.clone(), signal_rule());

        assert!(p.process(&event("", 100, 1)).await.is_err());
        assert_eq!(published(&rtdb).await.len(), 0);
    }

    #[tokio::test]
    async fn test_machines_are_independent() {
        let rtdb = Arc::new(MemoryRtdb::new());
        let p = processor(rtdb.clone(), signal_rule());

        p.process(&event("machine_A", 100, 1)).await.unwrap();
        let update = p.process(&event("machine_B", 150, 1)).await.unwrap();
        // machine_B's first event takes its own timestamp, unaffected by A
        assert_eq!(update.timestamp, Some(150));
    }
}
