//! Rule engine error types

use thiserror::Error;

/// Result type for rule operations
pub type Result<T> = std::result::Result<T, RuleError>;

/// Rule engine errors
#[derive(Debug, Error)]
pub enum RuleError {
    /// Rule text failed to parse
    #[error("Rule parsing error: {0}")]
    ParseError(String),

    /// Expression evaluation failed
    #[error("Rule execution error: {0}")]
    ExecutionError(String),

    /// Expression evaluated, but not to a status string
    #[error("Rule produced a non-string result: {0}")]
    NonStringResult(String),
}

impl From<evalexpr::EvalexprError> for RuleError {
    fn from(err: evalexpr::EvalexprError) -> Self {
        RuleError::ExecutionError(err.to_string())
    }
}
