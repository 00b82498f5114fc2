//! Rule representation
//!
//! A resolvable, executable decision procedure keyed by machine id. The
//! executable variant is a precompiled evalexpr operator tree; the two
//! sentinel variants cover the no-rule-registered and resolution-failed
//! cases with fixed outputs.

use crate::error::{Result, RuleError};
use evalexpr::Node;

/// A per-machine decision rule.
///
/// Stored centrally as expression text, fetched on demand and cached with a
/// TTL. Example rule text for a simple on/off machine:
///
/// ```text
/// if(signal == 1, "running", "stopped")
/// ```
///
/// Available variables: `signal`, `timestamp` (from the event) and
/// `prior_signal`, `prior_timestamp`, `prior_status` (from the stored state,
/// `()` when absent). The expression must evaluate to a string.
#[derive(Debug, Clone)]
pub enum Rule {
    /// Compiled expression fetched from the rule-storage service
    Expr {
        /// Original rule text (kept for logging and cache writes)
        source: String,
        /// Precompiled operator tree
        node: Node,
    },
    /// No rule registered for this machine; always yields "unknown"
    Default,
    /// Resolution failed or the text was unusable; always yields "error"
    Fallback,
}

impl Rule {
    /// Parse rule text into a compiled expression rule
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(RuleError::ParseError("rule text is empty".to_string()));
        }
        let node = evalexpr::build_operator_tree(trimmed)
            .map_err(|e| RuleError::ParseError(format!("{}: {}", trimmed, e)))?;
        Ok(Rule::Expr {
            source: trimmed.to_string(),
            node,
        })
    }

    /// Minimal "is this a rule" shape check, used by the rule-storage
    /// service to reject unusable submissions early
    pub fn check_shape(text: &str) -> Result<()> {
        Self::parse(text).map(|_| ())
    }

    /// Short description for log messages
    pub fn describe(&self) -> &str {
        match self {
            Rule::Expr { source, .. } => source,
            Rule::Default => "<default>",
            Rule::Fallback => "<fallback>",
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_expression() {
        let rule = Rule::parse(r#"if(signal == 1, "running", "stopped")"#).unwrap();
        assert!(matches!(rule, Rule::Expr { .. }));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(Rule::parse("  "), Err(RuleError::ParseError(_))));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            Rule::parse(r#"if(signal == 1, "running""#),
            Err(RuleError::ParseError(_))
        ));
    }

    #[test]
    fn test_check_shape() {
        assert!(Rule::check_shape(r#""unknown""#).is_ok());
        assert!(Rule::check_shape("def process(data, state): pass").is_err());
    }
}
