//! Command execution.
//!
//! `execute` is the whole lifecycle of one user command: validate and gate,
//! park the event queue unless the command wants its side-effect events
//! announced, stop continuous reading unless the command composes with it,
//! set direction, run the action, then speak either the error or the
//! landing description, and resume the queue. No command state outlives
//! the call.

use crate::nav::{self, MoveOutcome};
use crate::store::{self, CommandAction, CommandSpec, Direction, Platform};
use anyhow::{Result, bail};
use log::debug;
use pipeline::{Pipeline, RawEvent, SessionState, Timestamp};
use speech::{QueueMode, Utterance};
use tracing::info_span;

/// Executes commands against the shared session. Holds only cross-command
/// toggles (sticky mode, search widget), never per-command state.
pub struct CommandDispatch {
    platform: Platform,
    sticky_mode: bool,
    search_widget_open: bool,
}

impl Default for CommandDispatch {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandDispatch {
    pub fn new() -> Self {
        Self::with_platform(store::host_platform())
    }

    /// Hosts that know better (ChromeOS) pick the platform explicitly.
    pub fn with_platform(platform: Platform) -> Self {
        Self {
            platform,
            sticky_mode: false,
            search_widget_open: false,
        }
    }

    pub fn sticky_mode(&self) -> bool {
        self.sticky_mode
    }

    /// Execute `name`. Returns whether the browser's default key handling
    /// should still proceed (`true` = we did not consume the key).
    ///
    /// An unknown name is a programming error: the table is closed and
    /// static, so it can only mean a broken keymap.
    pub fn execute(
        &mut self,
        session: &mut SessionState,
        pipeline: &mut Pipeline,
        name: &str,
        now: Timestamp,
    ) -> Result<bool> {
        let Some(spec) = store::lookup(name) else {
            bail!("unknown command: {name}");
        };
        let span = info_span!("command", command = name);
        let _guard = span.enter();

        // Gating: a modal widget owns the keyboard, the platform filter
        // excludes us, or typing focus makes single-key commands unsafe.
        if session.modal_widget_active {
            return Ok(true);
        }
        if spec
            .platforms
            .is_some_and(|allowed| !allowed.contains(&self.platform))
        {
            return Ok(true);
        }
        if spec.skip_input && session.text_control_focused() {
            debug!("{name}: pass through, text input focused");
            return Ok(true);
        }

        // Suspend intake so the command's own side effects cannot produce
        // a second, redundant description.
        let suspended = if spec.allow_events {
            false
        } else {
            pipeline.suspend();
            true
        };
        if !spec.allow_continuation {
            pipeline.stop_reading();
        }
        if let Some(direction) = spec.direction {
            session.cursor.reversed = direction == Direction::Backward;
        }

        let outcome = self.run_action(session, pipeline, spec, now);

        if let Some(error) = outcome.error {
            session.speak(Utterance::annotated(error, QueueMode::Flush));
        } else if let Some(text) = outcome.spoken_text {
            session.speak(Utterance::new(text, QueueMode::Flush));
        } else if spec.announce {
            if let Some(prefix) = outcome.prefix {
                session.speak(Utterance::annotated(prefix, QueueMode::Flush));
            }
            if let Some(description) = session.cursor.describe(&session.document) {
                let mode = if outcome.prefix.is_some() {
                    QueueMode::Queue
                } else {
                    QueueMode::Flush
                };
                session.speak_description(&description, mode);
            }
        }

        if suspended {
            pipeline.resume(now);
        }
        Ok(false)
    }

    fn run_action(
        &mut self,
        session: &mut SessionState,
        pipeline: &mut Pipeline,
        spec: &CommandSpec,
        now: Timestamp,
    ) -> MoveOutcome {
        let reversed = session.cursor.reversed;
        match spec.action {
            CommandAction::Move => nav::step(session, session.cursor.granularity, reversed),
            CommandAction::MoveBy(granularity) => nav::step(session, granularity, reversed),
            CommandAction::CycleGranularity => {
                let next = session.cursor.granularity.cycled(!reversed);
                session.cursor.granularity = next;
                MoveOutcome {
                    spoken_text: Some(next.label().to_owned()),
                    ..MoveOutcome::default()
                }
            }
            CommandAction::Find(predicate) => nav::find_with_wrap(session, predicate, reversed),
            CommandAction::JumpToTop => nav::jump_to_edge(session, false),
            CommandAction::JumpToBottom => nav::jump_to_edge(session, true),
            CommandAction::ReadFromHere => {
                if let Some(description) = session.cursor.describe(&session.document) {
                    session.speak_description(&description, QueueMode::Flush);
                }
                pipeline.start_reading(now);
                MoveOutcome::default()
            }
            CommandAction::StopSpeech => {
                session.stop_speech();
                MoveOutcome::default()
            }
            CommandAction::SpeakPosition => {
                if let Some(description) = session.cursor.describe(&session.document) {
                    session.speak_description(&description, QueueMode::Flush);
                }
                MoveOutcome::default()
            }
            CommandAction::FullyDescribe => {
                self.fully_describe(session);
                MoveOutcome::default()
            }
            CommandAction::ReadLinkUrl => read_link_url(session),
            CommandAction::ReadCurrentTitle => {
                let title = session
                    .document
                    .attr(session.document.root(), "title")
                    .map(str::to_owned);
                match title {
                    Some(title) if !title.is_empty() => MoveOutcome {
                        spoken_text: Some(title),
                        ..MoveOutcome::default()
                    },
                    _ => MoveOutcome {
                        error: Some("No title.".to_owned()),
                        ..MoveOutcome::default()
                    },
                }
            }
            CommandAction::ActOnItem => activate_current(session, pipeline, now, false),
            CommandAction::ForceClick => activate_current(session, pipeline, now, true),
            CommandAction::Tts(property, increase) => {
                let value = session.tts.adjust(property, increase);
                let percent = (value * 100.0).round() as i64;
                MoveOutcome {
                    spoken_text: Some(format!("{} {percent}%", property.label())),
                    ..MoveOutcome::default()
                }
            }
            CommandAction::ToggleStickyMode => {
                self.sticky_mode = !self.sticky_mode;
                let text = if self.sticky_mode {
                    "Sticky mode enabled."
                } else {
                    "Sticky mode disabled."
                };
                MoveOutcome {
                    spoken_text: Some(text.to_owned()),
                    ..MoveOutcome::default()
                }
            }
            CommandAction::ToggleSearchWidget => {
                self.search_widget_open = !self.search_widget_open;
                let text = if self.search_widget_open {
                    "Search widget opened."
                } else {
                    "Search widget closed."
                };
                MoveOutcome {
                    spoken_text: Some(text.to_owned()),
                    ..MoveOutcome::default()
                }
            }
            CommandAction::TableMove(row_delta, col_delta) => {
                nav::table_move(session, row_delta, col_delta)
            }
            CommandAction::TableFirstCell => nav::table_corner(session, false),
            CommandAction::TableLastCell => nav::table_corner(session, true),
            CommandAction::TableLocation => nav::table_location(session),
        }
    }

    fn fully_describe(&self, session: &mut SessionState) {
        let Some(node) = session.cursor.node else {
            return;
        };
        // Full ancestor context, outermost first, not just the entered ones.
        let mut ancestors = session.document.ancestors(node);
        ancestors.reverse();
        let description = describe::describe_node(&session.document, node, &ancestors);
        session.speak_description(&description, QueueMode::Flush);
    }
}

fn read_link_url(session: &SessionState) -> MoveOutcome {
    let Some(node) = session.cursor.node else {
        return MoveOutcome {
            error: Some("No URL found.".to_owned()),
            ..MoveOutcome::default()
        };
    };
    let mut chain = vec![node];
    chain.extend(session.document.ancestors(node));
    let href = chain
        .into_iter()
        .find_map(|id| session.document.attr(id, "href").map(str::to_owned));
    match href {
        Some(href) => MoveOutcome {
            spoken_text: Some(href),
            ..MoveOutcome::default()
        },
        None => MoveOutcome {
            error: Some("No URL found.".to_owned()),
            ..MoveOutcome::default()
        },
    }
}

/// Activate the current item. Toggles toggle, everything else gets focus
/// moved to it; the synthetic events feed back through the normal queue so
/// the result is announced the ordinary way.
fn activate_current(
    session: &mut SessionState,
    pipeline: &mut Pipeline,
    now: Timestamp,
    force: bool,
) -> MoveOutcome {
    let Some(node) = session.cursor.node else {
        return MoveOutcome {
            error: Some("Nothing to activate.".to_owned()),
            ..MoveOutcome::default()
        };
    };
    if !session.document.is_attached(node) {
        return MoveOutcome {
            error: Some("Nothing to activate.".to_owned()),
            ..MoveOutcome::default()
        };
    }
    match session.document.role(node) {
        Some("checkbox") | Some("radio") => {
            let checked = session
                .document
                .control_state(node)
                .and_then(|state| state.checked)
                .unwrap_or(false);
            session.document.set_checked(node, !checked);
            pipeline.enqueue(RawEvent::change(node, now), now);
        }
        _ if force || session.document.is_control(node) => {
            session.document.set_focus(Some(node));
            pipeline.enqueue(RawEvent::focus(node, now), now);
        }
        _ => {
            return MoveOutcome {
                error: Some("Not a control.".to_owned()),
                ..MoveOutcome::default()
            };
        }
    }
    MoveOutcome::default()
}
