//! The mutable document tree and its ARIA-flavored queries.

use crate::node::{DomNode, EditableKind, NodeKind, Politeness};
use indextree::{Arena, NodeId};
use log::trace;
use std::collections::HashMap;

/// Roles that manage a virtual focus among their children via
/// `aria-activedescendant` instead of moving native focus.
const COMPOSITE_ROLES: &[&str] = &[
    "listbox", "grid", "menu", "menubar", "radiogroup", "tablist", "tree", "treegrid",
];

/// Landmark roles reachable by landmark navigation.
const LANDMARK_ROLES: &[&str] = &[
    "banner",
    "complementary",
    "contentinfo",
    "form",
    "main",
    "navigation",
    "region",
    "search",
];

/// Opt-out attribute: a node carrying this is described even when an
/// ancestor marks the subtree `aria-hidden`.
const IGNORE_ARIA_HIDDEN_ATTR: &str = "data-ignore-aria-hidden";

/// Live value/selection state of a form control.
///
/// Kept in a side table rather than the attribute bag so page scripts (and
/// tests standing in for them) can mutate a focused control without any
/// observable attribute change — the polling fallback exists to catch
/// exactly that.
#[derive(Debug, Clone, Default)]
pub struct ControlState {
    pub value: String,
    pub sel_start: usize,
    pub sel_end: usize,
    pub checked: Option<bool>,
}

/// An arena-backed document tree.
///
/// Nodes are never dropped while the document lives; detaching a subtree
/// leaves its ids valid but unattached, which is how page-driven removal is
/// modeled. `is_attached` is the liveness test consumers use.
#[derive(Debug)]
pub struct Document {
    arena: Arena<DomNode>,
    root: NodeId,
    focus: Option<NodeId>,
    controls: HashMap<NodeId, ControlState>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = arena.new_node(DomNode::default());
        Self {
            arena,
            root,
            focus: None,
            controls: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    // ---- construction / mutation ----

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let node = self.arena.new_node(DomNode::element(tag));
        parent.append(node, &mut self.arena);
        node
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let node = self.arena.new_node(DomNode::text(text));
        parent.append(node, &mut self.arena);
        node
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let Some(entry) = self.arena.get_mut(node) {
            entry.get_mut().set_attr(name, value);
        }
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let Some(entry) = self.arena.get_mut(node) {
            entry.get_mut().remove_attr(name);
        }
    }

    /// Replace the text of a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        if let Some(entry) = self.arena.get_mut(node)
            && let NodeKind::Text { text: old } = &mut entry.get_mut().kind
        {
            *old = text.to_owned();
        }
    }

    /// Detach a subtree from its parent. Ids stay valid; the subtree is
    /// simply no longer reachable from the root.
    pub fn detach(&mut self, node: NodeId) {
        trace!("detach {node:?}");
        node.detach(&mut self.arena);
        if self.focus.is_some_and(|focused| !self.is_attached(focused)) {
            self.focus = None;
        }
    }

    /// Re-attach a previously detached subtree under a new parent.
    pub fn reattach(&mut self, parent: NodeId, node: NodeId) {
        parent.append(node, &mut self.arena);
    }

    // ---- focus ----

    /// The node currently holding native focus, if any.
    pub fn focused(&self) -> Option<NodeId> {
        self.focus
    }

    pub fn set_focus(&mut self, node: Option<NodeId>) {
        self.focus = node;
    }

    // ---- control state ----

    pub fn set_value(&mut self, node: NodeId, value: &str) {
        let state = self.controls.entry(node).or_default();
        state.value = value.to_owned();
        state.sel_start = state.sel_start.min(state.value.len());
        state.sel_end = state.sel_end.min(state.value.len());
    }

    pub fn set_selection(&mut self, node: NodeId, start: usize, end: usize) {
        let state = self.controls.entry(node).or_default();
        state.sel_start = start.min(state.value.len());
        state.sel_end = end.min(state.value.len());
    }

    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        self.controls.entry(node).or_default().checked = Some(checked);
    }

    pub fn control_state(&self, node: NodeId) -> Option<&ControlState> {
        self.controls.get(&node)
    }

    // ---- structural queries ----

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.get(node).and_then(|entry| entry.parent())
    }

    /// Ancestors of `node`, nearest first, excluding `node` itself and the
    /// document root.
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        node.ancestors(&self.arena)
            .skip(1)
            .filter(|id| *id != self.root)
            .collect()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        node.children(&self.arena).collect()
    }

    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        node.ancestors(&self.arena).any(|id| id == ancestor)
    }

    /// Whether the node is still reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.arena.get(node).is_some_and(|entry| !entry.is_removed())
            && node.ancestors(&self.arena).any(|id| id == self.root)
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.arena.get(node).map(|entry| &entry.get().kind)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.arena.get(node)?.get().kind {
            NodeKind::Element { tag } => Some(tag.as_str()),
            _ => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.arena.get(node)?.get().attr(name)
    }

    fn attr_is(&self, node: NodeId, name: &str, value: &str) -> bool {
        self.attr(node, name) == Some(value)
    }

    /// Whitespace-collapsed text of the node's subtree, in document order.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for id in node.descendants(&self.arena) {
            if let Some(entry) = self.arena.get(id)
                && let NodeKind::Text { text } = &entry.get().kind
            {
                parts.push(text.as_str());
            }
        }
        collapse_whitespace(&parts.join(" "))
    }

    // ---- ARIA classification ----

    /// The node's role: an explicit `role=` attribute wins, otherwise the
    /// tag maps to an implicit role.
    pub fn role(&self, node: NodeId) -> Option<&str> {
        if let Some(role) = self.attr(node, "role") {
            return Some(role);
        }
        let tag = self.tag(node)?;
        let implicit = match tag {
            "a" => "link",
            "button" => "button",
            "img" => "img",
            "input" => match self.attr(node, "type") {
                Some("checkbox") => "checkbox",
                Some("radio") => "radio",
                Some("range") => "slider",
                Some("button") | Some("submit") | Some("reset") => "button",
                _ => "textbox",
            },
            "textarea" => "textbox",
            "select" => "combobox",
            "ul" | "ol" => "list",
            "li" => "listitem",
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
            "table" => "table",
            "dialog" => "dialog",
            "nav" => "navigation",
            "main" => "main",
            "header" => "banner",
            "footer" => "contentinfo",
            "form" => "form",
            "section" => "region",
            "aside" => "complementary",
            _ => "generic",
        };
        Some(implicit)
    }

    /// Heading level from the tag (`h3` -> 3) or `aria-level`.
    pub fn heading_level(&self, node: NodeId) -> Option<u8> {
        if let Some(level) = self.attr(node, "aria-level") {
            return level.parse().ok();
        }
        match self.tag(node)? {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        }
    }

    /// Whether the node is hidden from assistive output.
    ///
    /// True when the node or any ancestor carries `aria-hidden=true`, unless
    /// the node itself opts out with the escape attribute.
    pub fn is_aria_hidden(&self, node: NodeId) -> bool {
        if self.attr_is(node, IGNORE_ARIA_HIDDEN_ATTR, "true") {
            return false;
        }
        node.ancestors(&self.arena)
            .any(|id| self.attr_is(id, "aria-hidden", "true"))
    }

    /// Nearest ancestor (or self) with a dialog role.
    pub fn nearest_dialog_ancestor(&self, node: NodeId) -> Option<NodeId> {
        node.ancestors(&self.arena).find(|id| {
            matches!(self.role(*id), Some("dialog") | Some("alertdialog"))
        })
    }

    pub fn is_alert_dialog(&self, node: NodeId) -> bool {
        self.role(node) == Some("alertdialog")
    }

    /// Nearest ancestor (excluding self) that is a composite control.
    pub fn composite_control_ancestor(&self, node: NodeId) -> Option<NodeId> {
        node.ancestors(&self.arena).skip(1).find(|id| {
            self.role(*id)
                .is_some_and(|role| COMPOSITE_ROLES.contains(&role))
        })
    }

    /// Live-region ancestors of `node` (nearest first, self included),
    /// capped at `cap` to bound per-event work.
    pub fn live_region_ancestors(&self, node: NodeId, cap: usize) -> Vec<NodeId> {
        node.ancestors(&self.arena)
            .filter(|id| self.politeness(*id) != Politeness::Off)
            .take(cap)
            .collect()
    }

    /// Resolved politeness of a node considered as a live region.
    pub fn politeness(&self, node: NodeId) -> Politeness {
        match self.attr(node, "aria-live") {
            Some("assertive") => return Politeness::Assertive,
            Some("polite") => return Politeness::Polite,
            Some("off") => return Politeness::Off,
            _ => {}
        }
        match self.role(node) {
            Some("alert") => Politeness::Assertive,
            Some("status") | Some("log") | Some("timer") | Some("marquee") => Politeness::Polite,
            _ => Politeness::Off,
        }
    }

    pub fn is_landmark(&self, node: NodeId) -> bool {
        self.role(node)
            .is_some_and(|role| LANDMARK_ROLES.contains(&role))
    }

    /// Whether the node is an interactive control (has a widget role).
    pub fn is_control(&self, node: NodeId) -> bool {
        matches!(
            self.role(node),
            Some("button")
                | Some("checkbox")
                | Some("radio")
                | Some("textbox")
                | Some("combobox")
                | Some("slider")
                | Some("link")
                | Some("option")
                | Some("menuitem")
        )
    }

    /// Whether the node can take native focus.
    pub fn is_focusable(&self, node: NodeId) -> bool {
        if self.attr(node, "tabindex").is_some() {
            return true;
        }
        matches!(
            self.tag(node),
            Some("a") | Some("button") | Some("input") | Some("textarea") | Some("select")
        )
    }

    /// Classify the node as an editable text surface, if it is one.
    pub fn editable_kind(&self, node: NodeId) -> Option<EditableKind> {
        if self.attr_is(node, "contenteditable", "true") {
            return Some(EditableKind::RichText);
        }
        match self.tag(node)? {
            "textarea" => Some(EditableKind::MultiLine),
            "input" => match self.attr(node, "type").unwrap_or("text") {
                "text" | "search" | "email" | "url" | "tel" | "number" | "password" => {
                    Some(EditableKind::SingleLine)
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_password(&self, node: NodeId) -> bool {
        self.attr_is(node, "type", "password")
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let root = doc.root();
        let dialog = doc.append_element(root, "div");
        doc.set_attr(dialog, "role", "dialog");
        let input = doc.append_element(dialog, "input");
        (doc, dialog, input)
    }

    #[test]
    fn roles_map_from_tags_and_attrs() {
        let mut doc = Document::new();
        let root = doc.root();
        let heading = doc.append_element(root, "h2");
        let link = doc.append_element(root, "a");
        let custom = doc.append_element(root, "div");
        doc.set_attr(custom, "role", "tree");

        assert_eq!(doc.role(heading), Some("heading"));
        assert_eq!(doc.heading_level(heading), Some(2));
        assert_eq!(doc.role(link), Some("link"));
        assert_eq!(doc.role(custom), Some("tree"));
    }

    #[test]
    fn dialog_ancestor_resolution() {
        let (doc, dialog, input) = fixture();
        assert_eq!(doc.nearest_dialog_ancestor(input), Some(dialog));
        assert_eq!(doc.nearest_dialog_ancestor(dialog), Some(dialog));
        assert_eq!(doc.nearest_dialog_ancestor(doc.root()), None);
    }

    #[test]
    fn aria_hidden_honors_escape_attr() {
        let mut doc = Document::new();
        let root = doc.root();
        let hidden = doc.append_element(root, "div");
        doc.set_attr(hidden, "aria-hidden", "true");
        let inner = doc.append_element(hidden, "span");

        assert!(doc.is_aria_hidden(inner));
        doc.set_attr(inner, "data-ignore-aria-hidden", "true");
        assert!(!doc.is_aria_hidden(inner));
    }

    #[test]
    fn composite_ancestor_skips_self() {
        let mut doc = Document::new();
        let root = doc.root();
        let listbox = doc.append_element(root, "div");
        doc.set_attr(listbox, "role", "listbox");
        let option = doc.append_element(listbox, "div");
        doc.set_attr(option, "role", "option");

        assert_eq!(doc.composite_control_ancestor(option), Some(listbox));
        assert_eq!(doc.composite_control_ancestor(listbox), None);
    }

    #[test]
    fn detach_clears_focus_and_attachment() {
        let (mut doc, dialog, input) = fixture();
        doc.set_focus(Some(input));
        assert!(doc.is_attached(input));

        doc.detach(dialog);
        assert!(!doc.is_attached(input));
        assert_eq!(doc.focused(), None);
    }

    #[test]
    fn text_content_collapses_whitespace() {
        let mut doc = Document::new();
        let root = doc.root();
        let para = doc.append_element(root, "p");
        doc.append_text(para, "  hello \n ");
        let bold = doc.append_element(para, "b");
        doc.append_text(bold, "world ");

        assert_eq!(doc.text_content(para), "hello world");
    }

    #[test]
    fn live_region_politeness() {
        let mut doc = Document::new();
        let root = doc.root();
        let status = doc.append_element(root, "div");
        doc.set_attr(status, "role", "status");
        let alert = doc.append_element(root, "div");
        doc.set_attr(alert, "role", "alert");
        let plain = doc.append_element(root, "div");

        assert_eq!(doc.politeness(status), Politeness::Polite);
        assert_eq!(doc.politeness(alert), Politeness::Assertive);
        assert_eq!(doc.politeness(plain), Politeness::Off);

        let inner = doc.append_element(alert, "span");
        assert_eq!(doc.live_region_ancestors(inner, 2), vec![alert]);
    }

    #[test]
    fn control_state_clamps_selection() {
        let (mut doc, _dialog, input) = fixture();
        doc.set_value(input, "hello");
        doc.set_selection(input, 2, 99);
        let Some(state) = doc.control_state(input) else {
            unreachable!("control state was just set");
        };
        assert_eq!((state.sel_start, state.sel_end), (2, 5));
    }
}
