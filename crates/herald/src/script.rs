//! Recorded event scripts.
//!
//! A script is a JSON document plus a timestamped step list: events the
//! page fired, commands the user issued, and silent host-side mutations
//! (the kind the polling fallback exists to catch). The demo binary
//! replays scripts against a live session; tests replay them under
//! virtual time.

use crate::host::{self, HostMessage};
use crate::session::{DocumentEdit, Session};
use anyhow::{Context as _, Result, bail};
use log::warn;
use pipeline::{EventKind, KeyPayload, RawEvent, Timestamp};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

/// A whole replayable script.
#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub document: Vec<NodeSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One node of the scripted document. Nodes with an `id` attribute can be
/// referenced from steps.
#[derive(Debug, Deserialize)]
pub struct NodeSpec {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

/// One timestamped action.
#[derive(Debug, Deserialize)]
pub struct Step {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: StepAction,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Move native focus to the node and fire a focus event.
    Focus(String),
    /// Drop native focus and fire a blur event (optionally naming the node
    /// losing focus).
    Blur(Option<String>),
    /// Fire a change event at the node.
    Change(String),
    /// Fire a select event at the node.
    Select(String),
    /// Fire a keydown at the focused node.
    Keydown(KeySpec),
    /// Fire a subtree-modified event at the node.
    Mutation(String),
    /// Execute a user command by name.
    Command(String),
    /// Silently set a control's value (no event; polling must catch it).
    SetValue(SetValueSpec),
    /// Silently move a control's selection.
    SetSelection(SetSelectionSpec),
    /// Detach the node's subtree, as page scripts do.
    Detach(String),
}

#[derive(Debug, Deserialize)]
pub struct KeySpec {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub search: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetValueSpec {
    pub target: String,
    pub value: String,
    #[serde(default)]
    pub sel_start: Option<usize>,
    #[serde(default)]
    pub sel_end: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SetSelectionSpec {
    pub target: String,
    pub start: usize,
    pub end: usize,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("malformed script")
    }

    /// Build the scripted document into the session, returning the id
    /// registry steps refer to.
    pub fn build_document(&self, session: &mut Session) -> HashMap<String, dom::NodeId> {
        let mut registry = HashMap::new();
        let root = session.document().root();
        let mut stack: Vec<(&NodeSpec, dom::NodeId)> =
            self.document.iter().map(|spec| (spec, root)).collect();
        stack.reverse();
        while let Some((spec, parent)) = stack.pop() {
            let doc = session.document_mut();
            let node = doc.append_element(parent, &spec.tag);
            for (name, value) in &spec.attrs {
                doc.set_attr(node, name, value);
            }
            if let Some(text) = &spec.text {
                doc.append_text(node, text);
            }
            if let Some(id) = spec.attrs.get("id") {
                registry.insert(id.clone(), node);
            }
            for child in spec.children.iter().rev() {
                stack.push((child, node));
            }
        }
        registry
    }
}

/// Expand one step into host messages. A step can need both an edit and an
/// event (focus moves the real focus *and* fires the event).
fn step_messages(
    action: &StepAction,
    registry: &HashMap<String, dom::NodeId>,
    at: Timestamp,
) -> Result<Vec<HostMessage>> {
    let resolve = |id: &str| {
        registry
            .get(id)
            .copied()
            .with_context(|| format!("script references unknown id {id:?}"))
    };
    let messages = match action {
        StepAction::Focus(id) => {
            let node = resolve(id)?;
            vec![
                HostMessage::Edit(DocumentEdit::SetFocus(Some(node))),
                HostMessage::Event(RawEvent::focus(node, at)),
            ]
        }
        StepAction::Blur(id) => {
            let target = id.as_deref().map(resolve).transpose()?;
            vec![
                HostMessage::Edit(DocumentEdit::SetFocus(None)),
                HostMessage::Event(RawEvent::blur(target, at)),
            ]
        }
        StepAction::Change(id) => vec![HostMessage::Event(RawEvent::change(resolve(id)?, at))],
        StepAction::Select(id) => vec![HostMessage::Event(RawEvent::select(resolve(id)?, at))],
        StepAction::Keydown(key) => {
            let payload = KeyPayload {
                key: key.key.clone(),
                code: key.key.chars().next().map_or(0, u32::from),
                ctrl: key.ctrl,
                alt: key.alt,
                shift: key.shift,
                search_held: key.search,
            };
            vec![HostMessage::Event(RawEvent::new(
                EventKind::KeyDown(payload),
                None,
                at,
            ))]
        }
        StepAction::Mutation(id) => vec![HostMessage::Event(RawEvent::subtree_modified(
            Some(resolve(id)?),
            at,
        ))],
        StepAction::Command(name) => vec![HostMessage::Command(name.clone())],
        StepAction::SetValue(spec) => {
            let node = resolve(&spec.target)?;
            let mut messages = vec![HostMessage::Edit(DocumentEdit::SetValue {
                node,
                value: spec.value.clone(),
            })];
            if let (Some(start), Some(end)) = (spec.sel_start, spec.sel_end) {
                messages.push(HostMessage::Edit(DocumentEdit::SetSelection {
                    node,
                    start,
                    end,
                }));
            }
            messages
        }
        StepAction::SetSelection(spec) => {
            vec![HostMessage::Edit(DocumentEdit::SetSelection {
                node: resolve(&spec.target)?,
                start: spec.start,
                end: spec.end,
            })]
        }
        StepAction::Detach(id) => vec![HostMessage::Edit(DocumentEdit::Detach(resolve(id)?))],
    };
    Ok(messages)
}

/// How long after the last step the replay keeps pumping timers, so
/// trailing flushes and polls get their turn.
const TAIL_MS: u64 = 500;

/// Replay under virtual time: deterministic, no runtime needed.
pub fn replay(script: &Script, session: &mut Session) -> Result<()> {
    let registry = script.build_document(session);
    let mut steps: Vec<&Step> = script.steps.iter().collect();
    if steps.windows(2).any(|pair| pair[0].at_ms > pair[1].at_ms) {
        bail!("script steps must be ordered by at_ms");
    }

    let mut last = 0;
    for step in steps.drain(..) {
        let at = Timestamp::from_millis(step.at_ms);
        session.advance_until(at);
        for message in step_messages(&step.action, &registry, at)? {
            deliver(session, message, at);
        }
        last = step.at_ms;
    }
    session.advance_until(Timestamp::from_millis(last + TAIL_MS));
    Ok(())
}

fn deliver(session: &mut Session, message: HostMessage, now: Timestamp) {
    match message {
        HostMessage::Event(event) => session.handle_event(event, now),
        HostMessage::Edit(edit) => session.apply_edit(edit),
        HostMessage::Command(name) => {
            if let Err(error) = session.execute_command(&name, now) {
                warn!("command failed: {error:#}");
            }
        }
        HostMessage::Shutdown => {}
    }
}

/// Replay against the real host loop: a producer task feeds the intake
/// channel on the script's schedule while `host::run` consumes it.
pub async fn replay_realtime(script: &Script, session: &mut Session) -> Result<()> {
    let registry = script.build_document(session);
    let (sender, mut receiver) = host::channel();

    let mut scheduled: Vec<(u64, Vec<HostMessage>)> = Vec::new();
    for step in &script.steps {
        let at = Timestamp::from_millis(step.at_ms);
        scheduled.push((step.at_ms, step_messages(&step.action, &registry, at)?));
    }

    let producer = tokio::spawn(async move {
        let start = tokio::time::Instant::now();
        let mut last = 0;
        for (at_ms, messages) in scheduled {
            tokio::time::sleep_until(start + Duration::from_millis(at_ms)).await;
            for message in messages {
                if sender.send(message).is_err() {
                    return;
                }
            }
            last = at_ms;
        }
        // Let trailing flushes and polls run before shutting down.
        tokio::time::sleep_until(start + Duration::from_millis(last + TAIL_MS)).await;
        let _ = sender.send(HostMessage::Shutdown);
    });

    host::run(session, &mut receiver).await?;
    producer.await.context("script producer panicked")?;
    Ok(())
}
