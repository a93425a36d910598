//! Session wiring and host integration for the narration engine.
//!
//! [`Session`] bundles the shared state, the event pipeline and the
//! command dispatcher behind one deterministic, time-explicit API. The
//! [`host`] module drives a session from a tokio runtime with real time
//! and a single intake channel; the [`script`] module replays recorded
//! event scripts for the demo binary and for tests.

pub mod host;
pub mod script;
pub mod session;

pub use host::HostMessage;
pub use session::{DocumentEdit, Session};
