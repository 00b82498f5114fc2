//! Rule-derived status values

use serde::{Deserialize, Serialize};

/// Status produced by the default rule when no rule is registered
pub const STATUS_UNKNOWN: &str = "unknown";

/// Status produced when rule resolution or evaluation fails
pub const STATUS_ERROR: &str = "error";

/// The rule's output for one event.
///
/// The rule only decides the classification; signal and timestamp in the
/// stored state are imposed by the engine, so this stays a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derived {
    /// Rule-defined classification, e.g. "running" / "stopped" / "unknown" / "error"
    pub status: String,
}

impl Derived {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }

    /// The well-known evaluation-failure output
    pub fn error() -> Self {
        Self::new(STATUS_ERROR)
    }

    /// The well-known no-rule-registered output
    pub fn unknown() -> Self {
        Self::new(STATUS_UNKNOWN)
    }
}
