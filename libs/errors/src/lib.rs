//! Unified error handling for MachinePulse services
//!
//! One error type covers the engine's failure taxonomy. The first five
//! variants mirror the processing pipeline stages: rule resolution, rule
//! lookup, rule evaluation, state persistence and transport. None of them is
//! fatal to the process; each degrades according to its documented policy
//! (fallback rule, default rule, "error" status, or event redelivery).

use thiserror::Error;

/// Main error type for all MachinePulse services
#[derive(Debug, Error)]
pub enum PulseError {
    // ======================================
    // Processing pipeline errors
    // ======================================
    /// Rule-storage service unreachable or returned a server error.
    /// Policy: degrade to the fallback error rule, do not cache.
    #[error("Rule resolution failed for machine {machine_id}: {reason}")]
    RuleResolution { machine_id: String, reason: String },

    /// Rule-storage service has no rule for this machine.
    /// Policy: degrade to the default rule (status "unknown").
    #[error("No rule registered for machine {0}")]
    RuleNotFound(String),

    /// Rule text failed to parse or evaluate.
    /// Policy: the derived status becomes "error".
    #[error("Rule evaluation failed: {0}")]
    RuleEvaluation(String),

    /// Writing the machine state record failed.
    /// Policy: the event is failed and left for redelivery.
    #[error("State persistence failed for machine {machine_id}: {reason}")]
    StatePersistence { machine_id: String, reason: String },

    /// Queue fetch/ack/publish failed.
    /// Policy: treated like a persistence failure for retry purposes.
    #[error("Transport error: {0}")]
    Transport(String),

    // ======================================
    // Configuration errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    // ======================================
    // Infrastructure errors
    // ======================================
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timeout waiting for response from {0}")]
    Timeout(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PulseError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Shorthand for a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether the event that triggered this error should go back on the
    /// inbound queue for redelivery.
    ///
    /// Rule-side failures are absorbed into the derived status instead of
    /// being retried, so only persistence and transport failures requeue.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StatePersistence { .. } | Self::Transport(_) | Self::Redis(_) | Self::Timeout(_)
        )
    }
}

/// Result type alias using `PulseError`
pub type PulseResult<T> = std::result::Result<T, PulseError>;
