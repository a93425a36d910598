//! Event buffering and coalescing.
//!
//! Raw events buffer here for a short window so bursts can be deduplicated
//! before dispatch. The rules, in order:
//!
//! 1. only events at or after the *last* focus event survive a flush
//!    (an older focus's side context describes a node the user already
//!    left), except subtree mutations, which are never dropped this way;
//! 2. a flush that finds a freshly-arrived focus re-arms itself once per
//!    window, so programmatic focus bouncing settles before anything is
//!    spoken;
//! 3. but never past `max_wait` after the oldest buffered event, so a
//!    continuously mutating page cannot starve the user of all feedback.

use crate::config::PipelineConfig;
use crate::event::RawEvent;
use crate::timing::{Scheduler, TaskId, TaskKind, Timestamp};
use log::{debug, trace};

/// Result of a fired flush timer.
#[derive(Debug)]
pub enum FlushDecision {
    /// Nothing buffered (a stale timer after another flush drained us).
    Empty,
    /// A recent focus re-armed the window; nothing dispatched yet.
    Deferred,
    /// Dispatch these events in order, then the queue is empty.
    Dispatch(Vec<RawEvent>),
}

type ReadyWaiter = Box<dyn FnOnce() + Send>;

/// The coalescing buffer between the host's event firehose and the router.
#[derive(Default)]
pub struct EventQueue {
    buffer: Vec<RawEvent>,
    /// Arrival time of the oldest event since the queue last went empty.
    first_unprocessed: Option<Timestamp>,
    last_event_time: Option<Timestamp>,
    flush_task: Option<TaskId>,
    suspended: bool,
    ready_waiters: Vec<ReadyWaiter>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an event and arm the flush timer if none is pending.
    ///
    /// While suspended, events still buffer (bookkeeping stays correct) but
    /// the timer stays parked.
    pub fn enqueue(
        &mut self,
        event: RawEvent,
        now: Timestamp,
        scheduler: &mut Scheduler,
        config: &PipelineConfig,
    ) {
        if self.buffer.is_empty() {
            self.first_unprocessed = Some(now);
        }
        trace!("enqueue {:?} at {}ms", event.kind, now.millis());
        self.buffer.push(event);
        self.last_event_time = Some(now);
        if !self.suspended && self.flush_task.is_none() {
            self.flush_task = Some(scheduler.schedule(TaskKind::FlushQueue, now + config.wait()));
        }
    }

    /// The flush timer fired: filter, maybe defer, or hand over the batch.
    pub fn on_flush_fired(
        &mut self,
        now: Timestamp,
        scheduler: &mut Scheduler,
        config: &PipelineConfig,
    ) -> FlushDecision {
        self.flush_task = None;
        if self.suspended || self.buffer.is_empty() {
            return FlushDecision::Empty;
        }

        let last_focus = self
            .buffer
            .iter()
            .enumerate()
            .rev()
            .find(|(_, event)| event.is_focus())
            .map(|(index, event)| (index, event.timestamp));

        if let Some((focus_index, focus_time)) = last_focus {
            let before = self.buffer.len();
            let mut index = 0;
            self.buffer.retain(|event| {
                let keep = index >= focus_index || event.is_subtree_modified();
                index += 1;
                keep
            });
            if before != self.buffer.len() {
                debug!("focus supersession dropped {} events", before - self.buffer.len());
            }

            let focus_is_recent = now - focus_time < config.wait();
            let within_progress_bound = self
                .first_unprocessed
                .is_some_and(|first| now - first < config.max_wait());
            if focus_is_recent && within_progress_bound {
                // Focus is still bouncing; give it one more window. The
                // max-wait bound guarantees this cannot repeat forever.
                self.flush_task =
                    Some(scheduler.schedule(TaskKind::FlushQueue, now + config.wait()));
                return FlushDecision::Deferred;
            }
        }

        self.first_unprocessed = None;
        FlushDecision::Dispatch(std::mem::take(&mut self.buffer))
    }

    /// Park the flush timer; events keep buffering.
    pub fn suspend(&mut self, scheduler: &mut Scheduler) {
        self.suspended = true;
        if let Some(task) = self.flush_task.take() {
            scheduler.cancel(task);
        }
    }

    /// Un-park; if anything buffered while parked, re-arm the timer.
    pub fn resume(&mut self, now: Timestamp, scheduler: &mut Scheduler, config: &PipelineConfig) {
        self.suspended = false;
        if !self.buffer.is_empty() && self.flush_task.is_none() {
            self.flush_task = Some(scheduler.schedule(TaskKind::FlushQueue, now + config.wait()));
        }
    }

    /// Register an observer for "queue now empty". Fires immediately when
    /// already idle, otherwise after the next dispatching flush.
    pub fn on_ready(&mut self, waiter: ReadyWaiter) {
        if self.is_idle() {
            waiter();
        } else {
            self.ready_waiters.push(waiter);
        }
    }

    /// Drain registered waiters; the engine invokes them after a dispatch
    /// leaves the queue empty.
    pub fn take_ready_waiters(&mut self) -> Vec<ReadyWaiter> {
        std::mem::take(&mut self.ready_waiters)
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Empty and no flush pending.
    pub fn is_idle(&self) -> bool {
        self.buffer.is_empty() && self.flush_task.is_none()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn last_event_time(&self) -> Option<Timestamp> {
        self.last_event_time
    }
}
