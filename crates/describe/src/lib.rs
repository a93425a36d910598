//! Point-in-time descriptions of document nodes.
//!
//! Pure functions from a node (plus the ancestors the cursor crossed to
//! reach it) to a structured description: surrounding context, the node's
//! own text, the user-entered value, and any annotation. The speech layer
//! flattens this into utterances; test harnesses consume it structurally.

use dom::{Document, NodeId};
use log::trace;
use speech::{QueueMode, Utterance};

/// A password value never reaches speech; this placeholder does.
pub const PASSWORD_MASK: &str = "password protected";

/// Structured description of one cursor position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavDescription {
    /// Text for the ancestor levels entered since the previous position,
    /// outermost first ("list with 3 items", "navigation").
    pub context: String,
    /// The node's own name and role text.
    pub text: String,
    /// The user-entered value for controls, masked for passwords.
    pub user_value: String,
    /// Meta information spoken with annotation properties.
    pub annotation: String,
}

impl NavDescription {
    /// Flatten to utterances, first one carrying `mode`, the rest queued.
    pub fn to_utterances(&self, mode: QueueMode) -> Vec<Utterance> {
        let mut out = Vec::new();
        let mut main = String::new();
        for part in [&self.context, &self.text, &self.user_value] {
            if !part.is_empty() {
                if !main.is_empty() {
                    main.push(' ');
                }
                main.push_str(part);
            }
        }
        if !main.is_empty() {
            out.push(Utterance::new(main, mode));
        }
        if !self.annotation.is_empty() {
            let annotation_mode = if out.is_empty() { mode } else { QueueMode::Queue };
            out.push(Utterance::annotated(self.annotation.clone(), annotation_mode));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.context.is_empty()
            && self.text.is_empty()
            && self.user_value.is_empty()
            && self.annotation.is_empty()
    }
}

/// Accessible name of a node: `aria-label`, then `alt`, then collapsed
/// subtree text.
pub fn accessible_name(doc: &Document, node: NodeId) -> String {
    if let Some(label) = doc.attr(node, "aria-label") {
        return label.to_owned();
    }
    if let Some(alt) = doc.attr(node, "alt") {
        return alt.to_owned();
    }
    doc.text_content(node)
}

/// Spoken role word for a node; generic containers stay silent.
pub fn role_text(doc: &Document, node: NodeId) -> String {
    let Some(role) = doc.role(node) else {
        return String::new();
    };
    match role {
        "generic" | "document" => String::new(),
        "heading" => match doc.heading_level(node) {
            Some(level) => format!("heading {level}"),
            None => "heading".to_owned(),
        },
        "textbox" => "edit text".to_owned(),
        "img" => "graphic".to_owned(),
        "combobox" => "combo box".to_owned(),
        "listitem" => "list item".to_owned(),
        other => other.replace('-', " "),
    }
}

/// Spoken state words: checked, disabled, expanded, selected, required.
pub fn state_text(doc: &Document, node: NodeId) -> String {
    let mut parts: Vec<&str> = Vec::new();
    match doc.role(node) {
        Some("checkbox") | Some("radio") => {
            let checked = doc
                .control_state(node)
                .and_then(|state| state.checked)
                .unwrap_or_else(|| doc.attr(node, "aria-checked") == Some("true"));
            parts.push(if checked { "checked" } else { "not checked" });
        }
        _ => {}
    }
    match doc.attr(node, "aria-expanded") {
        Some("true") => parts.push("expanded"),
        Some("false") => parts.push("collapsed"),
        _ => {}
    }
    if doc.attr(node, "aria-selected") == Some("true") {
        parts.push("selected");
    }
    if doc.attr(node, "disabled").is_some() || doc.attr(node, "aria-disabled") == Some("true") {
        parts.push("disabled");
    }
    if doc.attr(node, "aria-required") == Some("true") || doc.attr(node, "required").is_some() {
        parts.push("required");
    }
    parts.join(" ")
}

/// The user-visible value of a control, masked for password fields.
pub fn value_text(doc: &Document, node: NodeId) -> String {
    if doc.editable_kind(node).is_none() && doc.role(node) != Some("slider") {
        return String::new();
    }
    if doc.is_password(node) {
        let has_value = doc
            .control_state(node)
            .is_some_and(|state| !state.value.is_empty());
        return if has_value {
            PASSWORD_MASK.to_owned()
        } else {
            String::new()
        };
    }
    doc.control_state(node)
        .map(|state| state.value.clone())
        .or_else(|| doc.attr(node, "value").map(str::to_owned))
        .unwrap_or_default()
}

/// Describe a node for narration.
///
/// `changed_ancestors` are the ancestor levels entered since the previous
/// cursor position, outermost first; each contributes one context phrase.
pub fn describe_node(doc: &Document, node: NodeId, changed_ancestors: &[NodeId]) -> NavDescription {
    trace!("describe {node:?} (+{} ancestors)", changed_ancestors.len());
    let mut context_parts: Vec<String> = Vec::new();
    for ancestor in changed_ancestors {
        let role = role_text(doc, *ancestor);
        if role.is_empty() {
            continue;
        }
        let phrase = match doc.role(*ancestor) {
            Some("list") => {
                let items = doc
                    .children(*ancestor)
                    .into_iter()
                    .filter(|child| doc.role(*child) == Some("listitem"))
                    .count();
                format!("list with {items} items")
            }
            _ => role,
        };
        context_parts.push(phrase);
    }

    let name = accessible_name(doc, node);
    let role = role_text(doc, node);
    let state = state_text(doc, node);
    let mut text = name;
    for extra in [role, state] {
        if !extra.is_empty() {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&extra);
        }
    }

    NavDescription {
        context: context_parts.join(" "),
        text,
        user_value: value_text(doc, node),
        annotation: String::new(),
    }
}
