//! Per-event-kind handlers.
//!
//! Each handler translates one raw event into state changes on the session
//! (cursor, dialog context, editable tracker) and at most a handful of
//! speech calls. Handlers tolerate null and detached targets as no-ops.

use crate::burst::BurstGate;
use crate::config::PipelineConfig;
use crate::dialog::DialogTransition;
use crate::event::{EventKind, RawEvent};
use crate::live::live_region_utterance;
use crate::session::SessionState;
use crate::timing::{Scheduler, TaskId, TaskKind, Timestamp};
use dom::NodeId;
use editable::{CursorStyle, EditableTracker};
use log::{debug, trace};
use speech::{QueueMode, Utterance};

/// Mutable engine internals a handler may touch besides the session.
pub struct RouterCtx<'engine> {
    pub scheduler: &'engine mut Scheduler,
    pub config: &'engine PipelineConfig,
    pub burst: &'engine mut BurstGate,
    pub poll_task: &'engine mut Option<TaskId>,
}

/// Route one event from a released batch.
pub fn dispatch_event(
    ctx: &mut RouterCtx<'_>,
    session: &mut SessionState,
    event: &RawEvent,
    now: Timestamp,
) {
    trace!("dispatch {:?}", event.kind);
    match &event.kind {
        EventKind::Focus => handle_focus(ctx, session, event.target, now),
        EventKind::Blur => {
            // Deferred by one tick: only a blur that is not immediately
            // followed by a refocus counts as focus lost.
            ctx.scheduler.schedule(TaskKind::BlurCheck, now);
        }
        EventKind::Change | EventKind::Select => handle_control_change(session, event.target),
        EventKind::SubtreeModified => handle_subtree_modified(ctx, session, event.target, now),
        EventKind::KeyDown(_) | EventKind::KeyUp(_) | EventKind::KeyPress(_) => {
            handle_key(session);
        }
    }
}

fn handle_focus(
    ctx: &mut RouterCtx<'_>,
    session: &mut SessionState,
    target: Option<NodeId>,
    now: Timestamp,
) {
    let Some(target) = target else {
        clear_tracking(ctx, session);
        return;
    };
    if !session.document.is_attached(target) {
        return;
    }
    if session.document.is_aria_hidden(target) {
        // Hidden content never gets described; treat as nothing focused.
        clear_tracking(ctx, session);
        return;
    }

    let composite = session.document.composite_control_ancestor(target);
    if let Some(composite) = composite
        && session.cursor.node == Some(composite)
    {
        // The composite widget moved its active descendant; this is a
        // value change of the tracked control, not a fresh focus.
        debug!("composite {composite:?} value change -> {target:?}");
        let description = describe::describe_node(&session.document, target, &[]);
        session.speak_description(&description, QueueMode::Flush);
        return;
    }

    sync_tracker(ctx, session, target, now);

    let mut mode = QueueMode::Flush;
    match session.dialog.on_focus(&session.document, target) {
        DialogTransition::Unchanged => {}
        DialogTransition::Exited => {
            session.speak(Utterance::annotated("Exited dialog.", QueueMode::Flush));
            mode = QueueMode::Queue;
        }
        DialogTransition::Entered(dialog) => {
            session.speak(Utterance::annotated("Entered dialog.", QueueMode::Flush));
            if let Some(label) = session.document.attr(dialog, "aria-label") {
                let label = label.to_owned();
                session.speak(Utterance::new(label, QueueMode::Queue));
            }
            if session.document.is_alert_dialog(dialog) {
                announce_alert_dialog_body(session, dialog);
            }
            mode = QueueMode::Queue;
        }
    }

    let promoted = composite.unwrap_or(target);
    session.cursor.sync_to(&session.document, promoted);
    if let Some(description) = session.cursor.describe(&session.document) {
        session.speak_description(&description, mode);
    }
}

/// Alert dialogs proactively read their body: the user may never navigate
/// into them.
fn announce_alert_dialog_body(session: &mut SessionState, dialog: NodeId) {
    let children = session.document.children(dialog);
    for child in children {
        if session.document.is_aria_hidden(child) {
            continue;
        }
        let text = session.document.text_content(child);
        if !text.is_empty() {
            session.speak(Utterance::new(text, QueueMode::Queue));
        }
    }
}

/// Install, keep, or drop the editable tracker for a newly focused node.
fn sync_tracker(
    ctx: &mut RouterCtx<'_>,
    session: &mut SessionState,
    target: NodeId,
    now: Timestamp,
) {
    if session.document.editable_kind(target).is_none() {
        clear_tracking(ctx, session);
        return;
    }
    if session
        .tracker
        .as_ref()
        .is_some_and(|tracker| tracker.node() == target)
    {
        return;
    }
    clear_tracking(ctx, session);
    let style = if ctx.config.block_cursor {
        CursorStyle::Block
    } else {
        CursorStyle::IBeam
    };
    session.tracker = EditableTracker::new(&session.document, target, style);
    if session.tracker.is_some() {
        // Polling fallback: a quick first sample, then the steady cadence.
        *ctx.poll_task = Some(
            ctx.scheduler
                .schedule(TaskKind::EditablePoll, now + ctx.config.poll_initial()),
        );
    }
}

fn clear_tracking(ctx: &mut RouterCtx<'_>, session: &mut SessionState) {
    if session.tracker.take().is_some() {
        debug!("editable tracking cleared");
    }
    if let Some(task) = ctx.poll_task.take() {
        ctx.scheduler.cancel(task);
    }
}

/// Change/Select: either the tracked editable changed, or a native control
/// (select, range, checkbox) changed value.
fn handle_control_change(session: &mut SessionState, target: Option<NodeId>) {
    let utterance = {
        let SessionState {
            tracker, document, ..
        } = session;
        tracker
            .as_mut()
            .and_then(|tracker| tracker.update(document, true))
    };
    if let Some(utterance) = utterance {
        session.speak(utterance);
        return;
    }
    if session.tracker.is_some() {
        // Tracked control produced no delta; nothing to say.
        return;
    }
    let Some(node) = target.or_else(|| session.document.focused()) else {
        return;
    };
    if !session.document.is_attached(node) || !session.document.is_control(node) {
        return;
    }
    let value = describe::value_text(&session.document, node);
    let state = describe::state_text(&session.document, node);
    let mut text = value;
    if !state.is_empty() {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(&state);
    }
    if !text.is_empty() {
        session.speak(Utterance::new(text, QueueMode::Flush));
    }
}

fn handle_subtree_modified(
    ctx: &mut RouterCtx<'_>,
    session: &mut SessionState,
    target: Option<NodeId>,
    now: Timestamp,
) {
    if !ctx.burst.allow(now) {
        trace!("mutation dropped by burst gate");
        return;
    }
    let Some(target) = target else {
        return;
    };
    session.walker.invalidate();
    let regions = session
        .document
        .live_region_ancestors(target, ctx.config.live_region_cap);
    for region in regions {
        if let Some(utterance) = live_region_utterance(&session.document, region) {
            session.speak(utterance);
        }
    }
}

/// Plain character keys update the tracked control rather than navigating;
/// command keys never reach this path (command dispatch suspends the queue).
fn handle_key(session: &mut SessionState) {
    let utterance = {
        let SessionState {
            tracker, document, ..
        } = session;
        tracker
            .as_mut()
            .and_then(|tracker| tracker.update(document, true))
    };
    if let Some(utterance) = utterance {
        session.speak(utterance);
    }
}

/// The deferred blur check: focus is really gone only if nothing grabbed
/// it during the tick.
pub fn handle_blur_check(ctx: &mut RouterCtx<'_>, session: &mut SessionState) {
    if session.document.focused().is_none() {
        debug!("blur confirmed; focus lost");
        clear_tracking(ctx, session);
    }
}

/// Polling fallback tick: catch silent value/selection drift, re-arm while
/// a text control stays focused.
pub fn handle_editable_poll(
    ctx: &mut RouterCtx<'_>,
    session: &mut SessionState,
    now: Timestamp,
) {
    *ctx.poll_task = None;
    let utterance = {
        let SessionState {
            tracker, document, ..
        } = session;
        tracker.as_mut().and_then(|tracker| {
            tracker
                .needs_update(document)
                .then(|| tracker.update(document, false))
                .flatten()
        })
    };
    if let Some(utterance) = utterance {
        session.speak(utterance);
    }
    if session.tracker.is_some() {
        *ctx.poll_task = Some(
            ctx.scheduler
                .schedule(TaskKind::EditablePoll, now + ctx.config.poll_steady()),
        );
    }
}
