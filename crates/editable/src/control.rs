//! Capability interface over concrete editable surfaces.
//!
//! A control variant knows how to sample live state from the document and
//! how its text divides into lines. The diff logic is shared free
//! functions over this interface; nothing is inherited.

use crate::state::{EditableState, clamp_to_char_boundary};
use dom::{Document, EditableKind, NodeId};
use std::ops::Range;

/// One focused editable surface.
pub trait TextControl {
    fn node(&self) -> NodeId;

    /// Re-sample value and selection from the live document. `None` when
    /// the node has gone away.
    fn sample_state(&self, doc: &Document) -> Option<EditableState>;

    /// Index of the line containing byte position `pos`.
    fn line_index(&self, value: &str, pos: usize) -> usize;

    /// Byte bounds of line `line`, excluding its terminator.
    fn line_bounds(&self, value: &str, line: usize) -> Range<usize>;
}

/// Select the concrete variant for a node once, at focus time.
pub fn new_control(doc: &Document, node: NodeId) -> Option<Box<dyn TextControl>> {
    match doc.editable_kind(node)? {
        EditableKind::SingleLine => Some(Box::new(SingleLineControl::new(node))),
        EditableKind::MultiLine => Some(Box::new(MultiLineControl::new(node))),
        EditableKind::RichText => Some(Box::new(RichTextControl::new(node))),
    }
}

fn sample_from_control_state(doc: &Document, node: NodeId) -> Option<EditableState> {
    if !doc.is_attached(node) {
        return None;
    }
    let is_password = doc.is_password(node);
    let state = doc.control_state(node);
    let value = state.map(|control| control.value.as_str()).unwrap_or_default();
    let (start, end) = state
        .map(|control| (control.sel_start, control.sel_end))
        .unwrap_or((0, 0));
    Some(EditableState::new(value, start, end, is_password))
}

/// `<input>`: a single line; newlines cannot occur.
pub struct SingleLineControl {
    node: NodeId,
}

impl SingleLineControl {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl TextControl for SingleLineControl {
    fn node(&self) -> NodeId {
        self.node
    }

    fn sample_state(&self, doc: &Document) -> Option<EditableState> {
        sample_from_control_state(doc, self.node)
    }

    fn line_index(&self, _value: &str, _pos: usize) -> usize {
        0
    }

    fn line_bounds(&self, value: &str, _line: usize) -> Range<usize> {
        0..value.len()
    }
}

/// `<textarea>`: lines split on `\n`.
pub struct MultiLineControl {
    node: NodeId,
}

impl MultiLineControl {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl TextControl for MultiLineControl {
    fn node(&self) -> NodeId {
        self.node
    }

    fn sample_state(&self, doc: &Document) -> Option<EditableState> {
        sample_from_control_state(doc, self.node)
    }

    fn line_index(&self, value: &str, pos: usize) -> usize {
        let pos = clamp_to_char_boundary(value, pos);
        value[..pos].matches('\n').count()
    }

    fn line_bounds(&self, value: &str, line: usize) -> Range<usize> {
        line_bounds_by_newline(value, line)
    }
}

/// `contenteditable` subtree: value is the flattened text content; line
/// structure follows newlines in that flattening.
pub struct RichTextControl {
    node: NodeId,
}

impl RichTextControl {
    pub fn new(node: NodeId) -> Self {
        Self { node }
    }
}

impl TextControl for RichTextControl {
    fn node(&self) -> NodeId {
        self.node
    }

    fn sample_state(&self, doc: &Document) -> Option<EditableState> {
        if !doc.is_attached(self.node) {
            return None;
        }
        // Rich text has no native value; the flattened subtree text is the
        // value, selection still comes from the control side table.
        let value = doc.text_content(self.node);
        let (start, end) = doc
            .control_state(self.node)
            .map(|control| (control.sel_start, control.sel_end))
            .unwrap_or((0, 0));
        Some(EditableState::new(&value, start, end, false))
    }

    fn line_index(&self, value: &str, pos: usize) -> usize {
        let pos = clamp_to_char_boundary(value, pos);
        value[..pos].matches('\n').count()
    }

    fn line_bounds(&self, value: &str, line: usize) -> Range<usize> {
        line_bounds_by_newline(value, line)
    }
}

fn line_bounds_by_newline(value: &str, line: usize) -> Range<usize> {
    let mut start = 0;
    let mut current = 0;
    for (index, ch) in value.char_indices() {
        if ch == '\n' {
            if current == line {
                return start..index;
            }
            current += 1;
            start = index + 1;
        }
    }
    if current == line {
        start..value.len()
    } else {
        value.len()..value.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiline_line_queries() {
        let control = MultiLineControl::new(Document::new().root());
        let value = "one\ntwo\nthree";
        assert_eq!(control.line_index(value, 0), 0);
        assert_eq!(control.line_index(value, 4), 1);
        assert_eq!(control.line_index(value, 13), 2);

        assert_eq!(&value[control.line_bounds(value, 0)], "one");
        assert_eq!(&value[control.line_bounds(value, 1)], "two");
        assert_eq!(&value[control.line_bounds(value, 2)], "three");
        assert!(value[control.line_bounds(value, 3)].is_empty());
    }

    #[test]
    fn constructor_switch_matches_kind() {
        let mut doc = Document::new();
        let root = doc.root();
        let input = doc.append_element(root, "input");
        let area = doc.append_element(root, "textarea");
        let rich = doc.append_element(root, "div");
        doc.set_attr(rich, "contenteditable", "true");
        let plain = doc.append_element(root, "div");

        assert!(new_control(&doc, input).is_some());
        assert!(new_control(&doc, area).is_some());
        assert!(new_control(&doc, rich).is_some());
        assert!(new_control(&doc, plain).is_none());
    }

    #[test]
    fn sampling_reads_control_state() {
        let mut doc = Document::new();
        let root = doc.root();
        let input = doc.append_element(root, "input");
        doc.set_value(input, "hello");
        doc.set_selection(input, 2, 4);

        let Some(control) = new_control(&doc, input) else {
            unreachable!("input is editable");
        };
        let Some(state) = control.sample_state(&doc) else {
            unreachable!("node is attached");
        };
        assert_eq!(state.value, "hello");
        assert_eq!((state.sel_start, state.sel_end), (2, 4));
        assert!(!state.is_password);
    }
}
