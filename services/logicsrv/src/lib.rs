//! logicsrv - rule-storage service
//!
//! A small CRUD key-value store of per-machine decision rules, reachable
//! over HTTP. The engine only needs the GET path; the POST path serves rule
//! authoring by administrators and rejects submissions that fail the
//! minimal rule shape check.

pub mod config;
pub mod routes;
pub mod store;

pub use config::Config;
pub use routes::create_routes;
pub use store::LogicStore;
