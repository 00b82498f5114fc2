//! Domain types for MachinePulse
//!
//! - [`Event`]: one observation from a machine, consumed once
//! - [`MachineState`]: the single authoritative record per machine
//! - [`Derived`]: the rule's output for one event
//! - [`StatusUpdate`]: the record emitted downstream per processed event
//!
//! The timestamp-freeze invariant lives in [`MachineState::apply`]: the
//! stored timestamp only advances when the signal changes between
//! consecutive events for the same machine.

pub mod event;
pub mod state;
pub mod status;

pub use event::Event;
pub use state::{MachineState, StatusUpdate};
pub use status::{Derived, STATUS_ERROR, STATUS_UNKNOWN};
