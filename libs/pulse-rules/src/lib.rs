//! MachinePulse rule engine
//!
//! A rule is text in a restricted expression language (evalexpr syntax)
//! evaluated against one event and the machine's prior state, producing a
//! status string. There is no code-execution sink: unparseable text degrades
//! to the fallback error rule, and evaluation failures degrade to the
//! "error" status.
//!
//! # Components
//!
//! - [`Rule`]: tagged representation (expression / default / fallback)
//! - [`RuleEvaluator`]: total evaluation, failures become `status = "error"`
//! - [`RuleStore`]: TTL-cached resolution against the rule-storage service
//! - [`RuleResolver`]: the seam trait the processor depends on

pub mod error;
pub mod evaluator;
pub mod rule;
pub mod store;

pub use error::{Result, RuleError};
pub use evaluator::RuleEvaluator;
pub use rule::Rule;
pub use store::{RuleResolver, RuleStore, RuleStoreConfig};
