//! Tokio-driven host loop.
//!
//! The one place real time and real concurrency exist. Producers push
//! [`HostMessage`]s down a single mpsc channel — that channel *is* the
//! single-writer discipline the shared session state requires — and the
//! loop interleaves message handling with sleeping until the pipeline's
//! next deadline.

use crate::session::{DocumentEdit, Session};
use anyhow::Result;
use log::{debug, warn};
use pipeline::{RawEvent, Timestamp};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Everything a host can feed the session.
#[derive(Debug)]
pub enum HostMessage {
    Event(RawEvent),
    Command(String),
    Edit(DocumentEdit),
    Shutdown,
}

/// Create the intake channel for a hosted session.
pub fn channel() -> (
    mpsc::UnboundedSender<HostMessage>,
    mpsc::UnboundedReceiver<HostMessage>,
) {
    mpsc::unbounded_channel()
}

/// Drive `session` until the channel closes or a `Shutdown` arrives.
pub async fn run(
    session: &mut Session,
    intake: &mut mpsc::UnboundedReceiver<HostMessage>,
) -> Result<()> {
    let start = Instant::now();
    let now_ms = |at: Instant| Timestamp::from_millis(at.duration_since(start).as_millis() as u64);

    loop {
        let now = now_ms(Instant::now());
        session.advance_to(now);

        let deadline = session
            .next_deadline()
            .map(|due| start + Duration::from_millis(due.millis()));

        let message = match deadline {
            Some(deadline) => tokio::select! {
                message = intake.recv() => Some(message),
                () = tokio::time::sleep_until(deadline) => None,
            },
            None => Some(intake.recv().await),
        };

        match message {
            // Timer fired; loop back around and run what came due.
            None => {}
            Some(None) | Some(Some(HostMessage::Shutdown)) => {
                debug!("host intake closed; draining");
                let now = now_ms(Instant::now());
                session.advance_until(now);
                return Ok(());
            }
            Some(Some(HostMessage::Event(event))) => {
                let now = now_ms(Instant::now());
                session.handle_event(event, now);
            }
            Some(Some(HostMessage::Edit(edit))) => {
                session.apply_edit(edit);
            }
            Some(Some(HostMessage::Command(name))) => {
                let now = now_ms(Instant::now());
                if let Err(error) = session.execute_command(&name, now) {
                    // A bad command name is a keymap bug; log it, keep serving.
                    warn!("command failed: {error:#}");
                }
            }
        }
    }
}
