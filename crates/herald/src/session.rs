//! The session: one page's worth of narration state and machinery.

use anyhow::Result;
use commands::CommandDispatch;
use dom::{Document, NodeId};
use pipeline::{Pipeline, PipelineConfig, RawEvent, SessionState, TickOutcome, Timestamp};
use speech::SpeechSink;

/// A host-applied mutation of the mirrored document.
///
/// Embedders funnel these through the same intake channel as events, which
/// keeps every write to session state on one consumer.
#[derive(Debug, Clone)]
pub enum DocumentEdit {
    SetFocus(Option<NodeId>),
    SetValue { node: NodeId, value: String },
    SetSelection { node: NodeId, start: usize, end: usize },
    SetChecked { node: NodeId, checked: bool },
    SetAttr { node: NodeId, name: String, value: String },
    Detach(NodeId),
}

/// Everything needed to narrate one document: shared state, the coalescing
/// pipeline, and command dispatch.
///
/// The session is deterministic: nothing here reads a clock. The host (or
/// a test) supplies timestamps to `handle_event` / `execute_command` and
/// pumps `advance_to` whenever scheduled work comes due. The host is also
/// responsible for keeping `state.document` in sync with the page it
/// mirrors (set focus before delivering the focus event, update control
/// values before delivering change events), the way a browser's
/// accessibility layer observes the live DOM.
pub struct Session {
    pub state: SessionState,
    pub pipeline: Pipeline,
    pub dispatch: CommandDispatch,
}

impl Session {
    pub fn new(sink: Box<dyn SpeechSink>) -> Self {
        Self::with_config(PipelineConfig::default(), sink)
    }

    pub fn with_config(config: PipelineConfig, sink: Box<dyn SpeechSink>) -> Self {
        Self {
            state: SessionState::new(sink),
            pipeline: Pipeline::new(config),
            dispatch: CommandDispatch::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.state.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.state.document
    }

    /// Accept one raw event from the host environment.
    pub fn handle_event(&mut self, event: RawEvent, now: Timestamp) {
        self.pipeline.enqueue(event, now);
    }

    /// Apply a host-side mutation to the mirrored document.
    pub fn apply_edit(&mut self, edit: DocumentEdit) {
        let doc = &mut self.state.document;
        match edit {
            DocumentEdit::SetFocus(node) => doc.set_focus(node),
            DocumentEdit::SetValue { node, value } => doc.set_value(node, &value),
            DocumentEdit::SetSelection { node, start, end } => doc.set_selection(node, start, end),
            DocumentEdit::SetChecked { node, checked } => doc.set_checked(node, checked),
            DocumentEdit::SetAttr { node, name, value } => {
                doc.set_attr(node, &name, &value);
                self.state.walker.invalidate();
            }
            DocumentEdit::Detach(node) => {
                doc.detach(node);
                self.state.walker.invalidate();
            }
        }
    }

    /// Execute a named user command.
    pub fn execute_command(&mut self, name: &str, now: Timestamp) -> Result<bool> {
        self.dispatch
            .execute(&mut self.state, &mut self.pipeline, name, now)
    }

    /// Run all scheduled work due at or before `now`.
    pub fn advance_to(&mut self, now: Timestamp) -> TickOutcome {
        self.pipeline.run_due(&mut self.state, now)
    }

    /// Earliest pending deadline, for the host's sleep.
    pub fn next_deadline(&mut self) -> Option<Timestamp> {
        self.pipeline.next_deadline()
    }

    /// Drive virtual time forward to `end`, running every intermediate
    /// deadline at its own timestamp. Tests and the script replayer use
    /// this; the real host sleeps instead.
    pub fn advance_until(&mut self, end: Timestamp) {
        while let Some(deadline) = self.next_deadline() {
            if deadline > end {
                break;
            }
            self.advance_to(deadline);
        }
        self.advance_to(end);
    }
}
