//! The single live tracker around the focused editable control.

use crate::control::{TextControl, new_control};
use crate::diff::{CursorStyle, describe_selection_changed, describe_text_changed};
use crate::state::EditableState;
use dom::{Document, NodeId};
use log::trace;
use speech::{QueueMode, Utterance};

/// Tracks one focused editable surface and narrates its deltas.
///
/// Constructed when focus lands on a recognized editable element and
/// dropped when focus leaves it; the session guarantees at most one
/// instance exists at a time.
pub struct EditableTracker {
    control: Box<dyn TextControl>,
    last: EditableState,
    style: CursorStyle,
}

impl EditableTracker {
    /// Wrap the control at `node`, sampling its initial state. `None` when
    /// the node is not an editable surface or has gone away.
    pub fn new(doc: &Document, node: NodeId, style: CursorStyle) -> Option<Self> {
        let control = new_control(doc, node)?;
        let last = control.sample_state(doc)?;
        trace!("tracking editable {node:?}");
        Some(Self {
            control,
            last,
            style,
        })
    }

    pub fn node(&self) -> NodeId {
        self.control.node()
    }

    pub fn last_state(&self) -> &EditableState {
        &self.last
    }

    /// Re-sample the control and narrate whatever changed since the last
    /// snapshot. `triggered_by_user` marks keystroke-driven updates, which
    /// interrupt speech; page-driven drift queues instead.
    pub fn update(&mut self, doc: &Document, triggered_by_user: bool) -> Option<Utterance> {
        let new = self.control.sample_state(doc)?;
        let utterance = self.changed(&new, triggered_by_user);
        self.last = new;
        utterance
    }

    fn changed(&self, new: &EditableState, triggered_by_user: bool) -> Option<Utterance> {
        let old = &self.last;
        if old == new {
            return None;
        }
        let text = if old.value == new.value {
            describe_selection_changed(self.control.as_ref(), old, new, self.style)?
        } else {
            describe_text_changed(old, new)?
        };
        let mode = if triggered_by_user {
            QueueMode::Flush
        } else {
            QueueMode::Queue
        };
        Some(Utterance::new(text, mode))
    }

    /// Whether live state has drifted from the last snapshot. The polling
    /// fallback calls this to catch script-driven mutation that fired no
    /// event at all.
    pub fn needs_update(&self, doc: &Document) -> bool {
        self.control
            .sample_state(doc)
            .is_some_and(|state| state != self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let input = doc.append_element(root, "input");
        doc.set_value(input, "abc");
        doc.set_selection(input, 3, 3);
        (doc, input)
    }

    #[test]
    fn keystroke_narrates_inserted_char_with_flush() {
        let (mut doc, input) = setup();
        let Some(mut tracker) = EditableTracker::new(&doc, input, CursorStyle::IBeam) else {
            unreachable!("input is editable");
        };

        doc.set_value(input, "abcd");
        doc.set_selection(input, 4, 4);
        let Some(utterance) = tracker.update(&doc, true) else {
            unreachable!("value changed");
        };
        assert_eq!(utterance.text, "d");
        assert_eq!(utterance.mode, QueueMode::Flush);
    }

    #[test]
    fn silent_drift_is_detected_and_queued() {
        let (mut doc, input) = setup();
        let Some(mut tracker) = EditableTracker::new(&doc, input, CursorStyle::IBeam) else {
            unreachable!("input is editable");
        };
        assert!(!tracker.needs_update(&doc));

        // Page script rewrites the value with no event.
        doc.set_value(input, "abc replaced");
        assert!(tracker.needs_update(&doc));
        let Some(utterance) = tracker.update(&doc, false) else {
            unreachable!("value changed");
        };
        assert_eq!(utterance.mode, QueueMode::Queue);
        assert!(!tracker.needs_update(&doc));
    }

    #[test]
    fn no_change_is_silent() {
        let (doc, input) = setup();
        let Some(mut tracker) = EditableTracker::new(&doc, input, CursorStyle::IBeam) else {
            unreachable!("input is editable");
        };
        assert!(tracker.update(&doc, true).is_none());
    }
}
