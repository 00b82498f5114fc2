//! statsrv - the MachinePulse event-processing engine
//!
//! Data flow: inbound queue → [`Dispatcher`] worker pool → [`EventProcessor`]
//! → { rule resolution, rule evaluation, state repository } → outbound queue.
//!
//! Per event, the processor loads the machine's prior state, resolves its
//! rule (TTL-cached), evaluates it, applies the timestamp-freeze invariant,
//! persists the new state and emits a status update. The dispatcher acks an
//! event only after the update has been accepted for emission; failed events
//! stay on the queue for redelivery.

pub mod config;
pub mod dispatcher;
pub mod processor;
pub mod transport;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use processor::EventProcessor;
pub use transport::{EventQueue, InflightEvent, ResultPublisher};
