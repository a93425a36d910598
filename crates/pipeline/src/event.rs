//! Raw input events.
//!
//! Events are constructed fully populated and never mutated afterwards;
//! anything the handlers need (modifier state, the manually tracked
//! search-key flag) is captured at creation time.

use crate::timing::Timestamp;
use dom::NodeId;

/// Modifier and key state captured with a key event.
///
/// `search_held` is tracked manually by the host because the platform does
/// not reliably report the search/meta modifier on key events.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPayload {
    pub key: String,
    pub code: u32,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub search_held: bool,
}

/// Event kind with per-kind payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Focus,
    Blur,
    Change,
    Select,
    KeyDown(KeyPayload),
    KeyUp(KeyPayload),
    KeyPress(KeyPayload),
    SubtreeModified,
}

/// One event as delivered by the host environment. Immutable once created.
///
/// A `None` target is accepted (timing bookkeeping must stay correct) and
/// ignored by node-dependent handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: EventKind,
    pub target: Option<NodeId>,
    pub timestamp: Timestamp,
}

impl RawEvent {
    pub fn new(kind: EventKind, target: Option<NodeId>, timestamp: Timestamp) -> Self {
        Self {
            kind,
            target,
            timestamp,
        }
    }

    pub fn focus(target: NodeId, timestamp: Timestamp) -> Self {
        Self::new(EventKind::Focus, Some(target), timestamp)
    }

    pub fn blur(target: Option<NodeId>, timestamp: Timestamp) -> Self {
        Self::new(EventKind::Blur, target, timestamp)
    }

    pub fn change(target: NodeId, timestamp: Timestamp) -> Self {
        Self::new(EventKind::Change, Some(target), timestamp)
    }

    pub fn select(target: NodeId, timestamp: Timestamp) -> Self {
        Self::new(EventKind::Select, Some(target), timestamp)
    }

    pub fn key_down(target: Option<NodeId>, payload: KeyPayload, timestamp: Timestamp) -> Self {
        Self::new(EventKind::KeyDown(payload), target, timestamp)
    }

    pub fn subtree_modified(target: Option<NodeId>, timestamp: Timestamp) -> Self {
        Self::new(EventKind::SubtreeModified, target, timestamp)
    }

    pub fn is_focus(&self) -> bool {
        matches!(self.kind, EventKind::Focus)
    }

    pub fn is_subtree_modified(&self) -> bool {
        matches!(self.kind, EventKind::SubtreeModified)
    }
}
