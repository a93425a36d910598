//! The pipeline facade: owns the queue, scheduler and gates, and advances
//! them against host-supplied time.
//!
//! `run_due` is the single pump: the host (or a test) calls it with "now"
//! and the engine runs every task due by then, including tasks those tasks
//! scheduled at the same instant — which is how the one-tick blur deferral
//! works. Within one flush, events dispatch strictly in arrival order; a
//! flush completes entirely before the next one can begin.

use crate::burst::BurstGate;
use crate::config::PipelineConfig;
use crate::event::RawEvent;
use crate::queue::{EventQueue, FlushDecision};
use crate::router::{self, RouterCtx};
use crate::session::SessionState;
use crate::timing::{Scheduler, TaskId, TaskKind, Timestamp};
use log::{debug, trace};
use speech::{QueueMode, Utterance};
use tracing::info_span;

/// Structured outcome of a single `run_due` pump, for hosts that want to
/// know whether anything user-visible happened.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    /// Events dispatched to handlers during this pump.
    pub dispatched: usize,
    /// Whether a flush left the queue empty during this pump.
    pub queue_drained: bool,
}

pub struct Pipeline {
    config: PipelineConfig,
    scheduler: Scheduler,
    queue: EventQueue,
    burst: BurstGate,
    poll_task: Option<TaskId>,
    reading_task: Option<TaskId>,
    reading_active: bool,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let burst = BurstGate::new(config.burst_window(), config.burst_max);
        Self {
            config,
            scheduler: Scheduler::new(),
            queue: EventQueue::new(),
            burst,
            poll_task: None,
            reading_task: None,
            reading_active: false,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Accept one raw event from the host.
    pub fn enqueue(&mut self, event: RawEvent, now: Timestamp) {
        self.queue
            .enqueue(event, now, &mut self.scheduler, &self.config);
    }

    /// Earliest moment any scheduled work becomes due, for host sleeping.
    pub fn next_deadline(&mut self) -> Option<Timestamp> {
        self.scheduler.next_deadline()
    }

    /// Run everything due at or before `now`.
    pub fn run_due(&mut self, session: &mut SessionState, now: Timestamp) -> TickOutcome {
        let span = info_span!("run_due", now_ms = now.millis());
        let _guard = span.enter();
        let mut outcome = TickOutcome::default();
        while let Some((_, kind)) = self.scheduler.pop_due(now) {
            match kind {
                TaskKind::FlushQueue => self.flush(session, now, &mut outcome),
                TaskKind::BlurCheck => {
                    let mut ctx = RouterCtx {
                        scheduler: &mut self.scheduler,
                        config: &self.config,
                        burst: &mut self.burst,
                        poll_task: &mut self.poll_task,
                    };
                    router::handle_blur_check(&mut ctx, session);
                }
                TaskKind::EditablePoll => {
                    let mut ctx = RouterCtx {
                        scheduler: &mut self.scheduler,
                        config: &self.config,
                        burst: &mut self.burst,
                        poll_task: &mut self.poll_task,
                    };
                    router::handle_editable_poll(&mut ctx, session, now);
                }
                TaskKind::ContinueReading => self.reading_tick(session, now),
            }
        }
        outcome
    }

    fn flush(&mut self, session: &mut SessionState, now: Timestamp, outcome: &mut TickOutcome) {
        match self
            .queue
            .on_flush_fired(now, &mut self.scheduler, &self.config)
        {
            FlushDecision::Empty => {}
            FlushDecision::Deferred => trace!("flush deferred by recent focus"),
            FlushDecision::Dispatch(batch) => {
                debug!("dispatching {} coalesced events", batch.len());
                let mut ctx = RouterCtx {
                    scheduler: &mut self.scheduler,
                    config: &self.config,
                    burst: &mut self.burst,
                    poll_task: &mut self.poll_task,
                };
                for event in &batch {
                    router::dispatch_event(&mut ctx, session, event, now);
                }
                outcome.dispatched += batch.len();
                if self.queue.is_empty() {
                    outcome.queue_drained = true;
                    for waiter in self.queue.take_ready_waiters() {
                        waiter();
                    }
                }
            }
        }
    }

    // ---- suspension (command dispatch) ----

    /// Park the flush timer for the duration of a command so the command's
    /// own side effects cannot double-announce. Events still buffer.
    pub fn suspend(&mut self) {
        self.queue.suspend(&mut self.scheduler);
    }

    pub fn resume(&mut self, now: Timestamp) {
        self.queue.resume(now, &mut self.scheduler, &self.config);
    }

    pub fn is_suspended(&self) -> bool {
        self.queue.is_suspended()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Register an observer for the next time the queue goes empty.
    pub fn on_ready(&mut self, waiter: Box<dyn FnOnce() + Send>) {
        self.queue.on_ready(waiter);
    }

    // ---- continuous reading ----

    pub fn reading_active(&self) -> bool {
        self.reading_active
    }

    /// Begin continuous reading from the cursor's current position.
    pub fn start_reading(&mut self, now: Timestamp) {
        self.reading_active = true;
        if self.reading_task.is_none() {
            self.reading_task = Some(
                self.scheduler
                    .schedule(TaskKind::ContinueReading, now + self.config.read_interval()),
            );
        }
    }

    /// Stop a continuous reading session, if one is running.
    pub fn stop_reading(&mut self) {
        self.reading_active = false;
        if let Some(task) = self.reading_task.take() {
            self.scheduler.cancel(task);
        }
    }

    fn reading_tick(&mut self, session: &mut SessionState, now: Timestamp) {
        self.reading_task = None;
        if !self.reading_active {
            return;
        }
        if !self.queue.is_empty() {
            // Page activity in flight; read on once the queue settles.
            self.reading_task = Some(
                self.scheduler
                    .schedule(TaskKind::ContinueReading, now + self.config.read_interval()),
            );
            return;
        }
        let next = {
            let SessionState {
                walker,
                document,
                cursor,
                ..
            } = session;
            walker.step(document, cursor.node, false)
        };
        match next {
            None => {
                session.speak(Utterance::annotated("End of document.", QueueMode::Queue));
                self.reading_active = false;
            }
            Some(node) => {
                session.cursor.sync_to(&session.document, node);
                if let Some(description) = session.cursor.describe(&session.document) {
                    session.speak_description(&description, QueueMode::Queue);
                }
                self.reading_task = Some(
                    self.scheduler
                        .schedule(TaskKind::ContinueReading, now + self.config.read_interval()),
                );
            }
        }
    }
}
