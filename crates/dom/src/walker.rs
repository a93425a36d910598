//! Linear traversal over narratable nodes.
//!
//! Navigation commands and continuous reading walk the document as a flat,
//! document-ordered list of "narratable" nodes. The list is cached; any
//! access that observes a detached cached node invalidates and recomputes
//! it, so page mutation costs at most one rebuild on the next query.

use crate::document::Document;
use crate::node::NodeKind;
use indextree::NodeId;
use log::debug;

/// Predicates backing the find-next-matching commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavPredicate {
    /// Any heading, or a specific level when set.
    Heading(Option<u8>),
    Link,
    Button,
    Checkbox,
    Radio,
    ComboBox,
    EditText,
    FormField,
    Graphic,
    List,
    ListItem,
    Table,
    Landmark,
    Slider,
}

impl NavPredicate {
    pub fn matches(self, doc: &Document, node: NodeId) -> bool {
        match self {
            Self::Heading(level) => {
                doc.role(node) == Some("heading")
                    && level.is_none_or(|want| doc.heading_level(node) == Some(want))
            }
            Self::Link => doc.role(node) == Some("link"),
            Self::Button => doc.role(node) == Some("button"),
            Self::Checkbox => doc.role(node) == Some("checkbox"),
            Self::Radio => doc.role(node) == Some("radio"),
            Self::ComboBox => doc.role(node) == Some("combobox"),
            Self::EditText => doc.editable_kind(node).is_some(),
            Self::FormField => {
                matches!(
                    doc.role(node),
                    Some("textbox") | Some("checkbox") | Some("radio") | Some("combobox")
                        | Some("slider") | Some("button")
                )
            }
            Self::Graphic => doc.role(node) == Some("img"),
            Self::List => doc.role(node) == Some("list"),
            Self::ListItem => doc.role(node) == Some("listitem"),
            Self::Table => doc.role(node) == Some("table"),
            Self::Landmark => doc.is_landmark(node),
            Self::Slider => doc.role(node) == Some("slider"),
        }
    }

    /// The phrase spoken when a search finds nothing, e.g. "No next heading."
    pub fn noun(self) -> &'static str {
        match self {
            Self::Heading(_) => "heading",
            Self::Link => "link",
            Self::Button => "button",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio button",
            Self::ComboBox => "combo box",
            Self::EditText => "editable text",
            Self::FormField => "form field",
            Self::Graphic => "graphic",
            Self::List => "list",
            Self::ListItem => "list item",
            Self::Table => "table",
            Self::Landmark => "landmark",
            Self::Slider => "slider",
        }
    }
}

/// Cached document-order list of narratable nodes.
#[derive(Debug)]
pub struct Walker {
    order: Vec<NodeId>,
    dirty: bool,
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}

impl Walker {
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            dirty: true,
        }
    }

    /// Force a rebuild on next access (call after bulk mutation).
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// The node after/before `current` in document order, not wrapping.
    /// `None` from a detached or unknown `current` starts from the edge.
    pub fn step(&mut self, doc: &Document, current: Option<NodeId>, reversed: bool) -> Option<NodeId> {
        self.ensure(doc);
        let position = current.and_then(|node| self.order.iter().position(|id| *id == node));
        match (position, reversed) {
            (None, false) => self.order.first().copied(),
            (None, true) => self.order.last().copied(),
            (Some(pos), false) => self.order.get(pos + 1).copied(),
            (Some(pos), true) => pos.checked_sub(1).and_then(|prev| self.order.get(prev).copied()),
        }
    }

    /// First narratable node at the given document edge.
    pub fn edge(&mut self, doc: &Document, from_end: bool) -> Option<NodeId> {
        self.ensure(doc);
        if from_end {
            self.order.last().copied()
        } else {
            self.order.first().copied()
        }
    }

    /// Next node strictly after/before `from` matching the predicate, not
    /// wrapping. Wraparound is the caller's retry policy.
    pub fn find(
        &mut self,
        doc: &Document,
        from: Option<NodeId>,
        predicate: NavPredicate,
        reversed: bool,
    ) -> Option<NodeId> {
        let mut cursor = from;
        loop {
            cursor = self.step(doc, cursor, reversed);
            let node = cursor?;
            if predicate.matches(doc, node) {
                return Some(node);
            }
        }
    }

    fn ensure(&mut self, doc: &Document) {
        // A cached node detached by page mutation invalidates the whole
        // order; recompute once rather than patching incrementally.
        if !self.dirty && self.order.iter().any(|id| !doc.is_attached(*id)) {
            debug!("walker cache hit detached node; rebuilding");
            self.dirty = true;
        }
        if !self.dirty {
            return;
        }
        self.order = collect_narratable(doc);
        self.dirty = false;
        debug!("walker rebuilt: {} narratable nodes", self.order.len());
    }
}

/// Document-order list of nodes worth stopping on: visible elements that are
/// controls, headings, landmarks, graphics, or direct text containers.
fn collect_narratable(doc: &Document) -> Vec<NodeId> {
    let mut out = Vec::new();
    collect_into(doc, doc.root(), &mut out);
    out
}

fn collect_into(doc: &Document, node: NodeId, out: &mut Vec<NodeId>) {
    for child in doc.children(node) {
        if is_narratable(doc, child) {
            out.push(child);
        }
        collect_into(doc, child, out);
    }
}

fn is_narratable(doc: &Document, node: NodeId) -> bool {
    if doc.tag(node).is_none() || doc.is_aria_hidden(node) {
        return false;
    }
    if doc.is_control(node) || doc.is_landmark(node) {
        return true;
    }
    if matches!(
        doc.role(node),
        Some("heading") | Some("img") | Some("list") | Some("listitem") | Some("table")
    ) {
        return true;
    }
    // Plain containers count only when they directly hold non-empty text.
    doc.children(node).into_iter().any(|child| {
        matches!(doc.kind(child), Some(NodeKind::Text { text }) if !text.trim().is_empty())
    })
}
