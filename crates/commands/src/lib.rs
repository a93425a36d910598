//! User-issued navigation and action commands.
//!
//! A closed, static table maps each command name to a behavior descriptor
//! ([`store::CommandSpec`]); [`dispatch::CommandDispatch`] validates and
//! executes them against the shared session state, with the gating,
//! queue-suspension and wraparound-search policies the descriptors encode.

pub mod dispatch;
pub mod nav;
pub mod store;

pub use dispatch::CommandDispatch;
pub use nav::MoveOutcome;
pub use store::{CommandAction, CommandSpec, Direction, Platform, command_names, lookup};
