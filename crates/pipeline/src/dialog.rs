//! Dialog entry/exit tracking.

use dom::{Document, NodeId};

/// What a focus move did to the dialog context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogTransition {
    Unchanged,
    Entered(NodeId),
    Exited,
}

/// Process-wide record of the dialog the user is inside, if any.
///
/// Set only when a focus event's ancestor-chain dialog differs from the
/// stored one; cleared only when focus leaves without landing back inside
/// the stored dialog's subtree.
#[derive(Debug, Default)]
pub struct DialogContext {
    current: Option<NodeId>,
}

impl DialogContext {
    pub fn current(&self) -> Option<NodeId> {
        self.current
    }

    /// Resolve a focus landing on `target` against the stored dialog.
    pub fn on_focus(&mut self, doc: &Document, target: NodeId) -> DialogTransition {
        let dialog = doc.nearest_dialog_ancestor(target);
        match (self.current, dialog) {
            (old, new) if old == new => DialogTransition::Unchanged,
            (Some(_), None) => {
                self.current = None;
                DialogTransition::Exited
            }
            (_, Some(new)) => {
                self.current = Some(new);
                DialogTransition::Entered(new)
            }
            (None, None) => DialogTransition::Unchanged,
        }
    }

    /// Forget the stored dialog (page unload, dialog removal).
    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_announces_once_each_way() {
        let mut doc = Document::new();
        let root = doc.root();
        let dialog = doc.append_element(root, "div");
        doc.set_attr(dialog, "role", "dialog");
        let inside_a = doc.append_element(dialog, "button");
        let inside_b = doc.append_element(dialog, "button");
        let outside = doc.append_element(root, "a");

        let mut context = DialogContext::default();
        assert_eq!(context.on_focus(&doc, inside_a), DialogTransition::Entered(dialog));
        // Bouncing between elements inside the same dialog stays quiet.
        assert_eq!(context.on_focus(&doc, inside_b), DialogTransition::Unchanged);
        assert_eq!(context.on_focus(&doc, inside_a), DialogTransition::Unchanged);

        assert_eq!(context.on_focus(&doc, outside), DialogTransition::Exited);
        assert_eq!(context.on_focus(&doc, outside), DialogTransition::Unchanged);
    }

    #[test]
    fn moving_between_dialogs_reenters() {
        let mut doc = Document::new();
        let root = doc.root();
        let first = doc.append_element(root, "div");
        doc.set_attr(first, "role", "dialog");
        let second = doc.append_element(root, "div");
        doc.set_attr(second, "role", "alertdialog");
        let in_first = doc.append_element(first, "button");
        let in_second = doc.append_element(second, "button");

        let mut context = DialogContext::default();
        assert_eq!(context.on_focus(&doc, in_first), DialogTransition::Entered(first));
        assert_eq!(context.on_focus(&doc, in_second), DialogTransition::Entered(second));
        assert_eq!(context.current(), Some(second));
    }
}
