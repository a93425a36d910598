//! Event coalescing and navigation-state synchronization.
//!
//! This crate is the engine's core: it buffers the host's event firehose,
//! coalesces it under bounded timing windows, and routes the surviving
//! events onto shared session state (navigation cursor, dialog context,
//! editable tracker) and the speech sink.
//!
//! Everything is single-threaded and time-explicit: the host supplies
//! `Timestamp`s and pumps [`engine::Pipeline::run_due`]; tests drive the
//! same API with virtual time.

pub mod burst;
pub mod config;
pub mod cursor;
pub mod dialog;
pub mod engine;
pub mod event;
pub mod live;
pub mod queue;
pub mod router;
pub mod session;
pub mod timing;

pub use config::PipelineConfig;
pub use cursor::{Granularity, NavigationCursor};
pub use dialog::{DialogContext, DialogTransition};
pub use engine::{Pipeline, TickOutcome};
pub use event::{EventKind, KeyPayload, RawEvent};
pub use session::SessionState;
pub use timing::{Scheduler, TaskId, TaskKind, Timestamp};
