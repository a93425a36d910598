use smallvec::SmallVec;

/// The kind of a document node.
#[derive(Debug, Clone, Default)]
pub enum NodeKind {
    #[default]
    Document,
    Element {
        tag: String,
    },
    Text {
        text: String,
    },
}

/// A single node in the document arena: its kind plus an attribute bag.
///
/// Attributes are stored inline; four covers the common case (role, name,
/// state, value) without a heap allocation.
#[derive(Debug, Clone, Default)]
pub struct DomNode {
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
}

impl DomNode {
    pub fn element(tag: &str) -> Self {
        Self {
            kind: NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            attrs: SmallVec::new(),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text {
                text: text.to_owned(),
            },
            attrs: SmallVec::new(),
        }
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(entry) = self.attrs.iter_mut().find(|(attr, _)| attr == name) {
            entry.1 = value.to_owned();
        } else {
            self.attrs.push((name.to_owned(), value.to_owned()));
        }
    }

    /// Remove an attribute, returning whether it was present.
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(attr, _)| attr != name);
        self.attrs.len() != before
    }
}

/// The flavor of editable surface a node exposes.
///
/// Selected once when focus lands on the control; drives which line/selection
/// capabilities the editable tracker uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditableKind {
    /// `<input>` with a text-like type.
    SingleLine,
    /// `<textarea>`.
    MultiLine,
    /// `contenteditable` subtree.
    RichText,
}

/// Live region politeness, per `aria-live` / implicit role semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Politeness {
    Off,
    /// Announce when convenient; queued behind pending speech.
    Polite,
    /// Announce immediately; interrupts pending speech.
    Assertive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_set_get_remove() {
        let mut node = DomNode::element("DIV");
        assert!(matches!(&node.kind, NodeKind::Element { tag } if tag == "div"));
        assert_eq!(node.attr("role"), None);

        node.set_attr("role", "button");
        assert_eq!(node.attr("role"), Some("button"));

        node.set_attr("role", "link");
        assert_eq!(node.attr("role"), Some("link"));
        assert_eq!(node.attrs.len(), 1);

        assert!(node.remove_attr("role"));
        assert!(!node.remove_attr("role"));
    }
}
