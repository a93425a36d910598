//! Editable-control tracking and speakable edit feedback.
//!
//! When focus lands on an editable surface the session constructs one
//! [`EditableTracker`] around it; the tracker re-samples the control's
//! value and selection on events and on a polling fallback, diffs against
//! the previous snapshot, and emits the minimal phrase describing what
//! changed. At most one tracker is live at a time, tied to the focused
//! control.

pub mod control;
pub mod diff;
pub mod state;
pub mod tracker;

pub use control::{MultiLineControl, RichTextControl, SingleLineControl, TextControl, new_control};
pub use diff::{CursorStyle, describe_selection_changed, describe_text_changed};
pub use state::EditableState;
pub use tracker::EditableTracker;
