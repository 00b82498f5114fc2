//! RuleEvaluator - total rule evaluation
//!
//! Evaluation is externally authored input, so it is firewalled: any failure
//! (type error, unknown variable, non-string result) is caught and converted
//! to the "error" status instead of propagating. One bad rule must never
//! take down the engine.

use crate::error::{Result, RuleError};
use crate::rule::Rule;
use evalexpr::{ContextWithMutableVariables, HashMapContext, Value};
use pulse_model::{Derived, Event, MachineState};
use tracing::warn;

/// Executes a resolved rule against an incoming event and the machine's
/// previous state.
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator;

impl RuleEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate `rule` for `event` with `prior` state.
    ///
    /// Total from the caller's perspective: failures yield
    /// `Derived { status: "error" }` and a warning, never an `Err`.
    pub fn evaluate(&self, rule: &Rule, event: &Event, prior: &MachineState) -> Derived {
        match rule {
            Rule::Default => Derived::unknown(),
            Rule::Fallback => Derived::error(),
            Rule::Expr { source, node } => {
                match Self::evaluate_expr(node, event, prior) {
                    Ok(derived) => derived,
                    Err(e) => {
                        warn!(
                            machine_id = %event.machine_id,
                            rule = %source,
                            "Rule evaluation failed: {}", e
                        );
                        Derived::error()
                    },
                }
            },
        }
    }

    fn evaluate_expr(
        node: &evalexpr::Node,
        event: &Event,
        prior: &MachineState,
    ) -> Result<Derived> {
        let context = Self::build_context(event, prior)?;
        let value = node.eval_with_context(&context)?;
        match value {
            Value::String(status) => Ok(Derived::new(status)),
            other => Err(RuleError::NonStringResult(format!("{:?}", other))),
        }
    }

    /// Expose the event and prior state as expression variables.
    ///
    /// Absent prior fields become `Empty`, so comparisons against them are
    /// simply false rather than evaluation errors.
    fn build_context(event: &Event, prior: &MachineState) -> Result<HashMapContext> {
        let mut context = HashMapContext::new();

        let mut set = |name: &str, value: Value| -> Result<()> {
            context
                .set_value(name.to_string(), value)
                .map_err(|e| RuleError::ExecutionError(format!("set {}: {}", name, e)))
        };

        set("signal", Value::Int(event.signal))?;
        set("timestamp", Value::Int(event.timestamp))?;
        set(
            "prior_signal",
            prior.signal.map(Value::Int).unwrap_or(Value::Empty),
        )?;
        set(
            "prior_timestamp",
            prior.timestamp.map(Value::Int).unwrap_or(Value::Empty),
        )?;
        set(
            "prior_status",
            if prior.status.is_empty() {
                Value::Empty
            } else {
                Value::String(prior.status.clone())
            },
        )?;

        Ok(context)
    }
}
