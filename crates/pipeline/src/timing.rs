//! Deterministic time and task scheduling.
//!
//! The engine never reads a wall clock. Every entry point takes a
//! [`Timestamp`] supplied by the host (real time in production, virtual
//! time in tests), and all "waiting" is a task scheduled against that
//! timeline. Handles are cancellable, so a parked timer is a first-class
//! state rather than a callback that must be ignored.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::ops::{Add, Sub};
use std::time::Duration;

/// A millisecond tick on the host-supplied timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const ZERO: Self = Self(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn millis(self) -> u64 {
        self.0
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0.saturating_add(rhs.as_millis() as u64))
    }
}

impl Sub<Timestamp> for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(rhs.0))
    }
}

/// Cancellable handle to a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// What a scheduled task does when it fires. Tasks carry no closures so
/// the whole schedule is inspectable and replayable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Coalescer flush window elapsed.
    FlushQueue,
    /// Deferred blur resolution: decide whether focus is really gone.
    BlurCheck,
    /// Polling fallback for silent editable-control mutation.
    EditablePoll,
    /// Continuous reading: advance to the next node when the queue is idle.
    ContinueReading,
}

#[derive(Debug, PartialEq, Eq)]
struct Entry {
    deadline: Timestamp,
    seq: u64,
    id: TaskId,
    kind: TaskKind,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-heap of scheduled tasks with lazy cancellation.
#[derive(Debug, Default)]
pub struct Scheduler {
    heap: BinaryHeap<Reverse<Entry>>,
    cancelled: HashSet<TaskId>,
    next_id: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TaskKind, deadline: Timestamp) -> TaskId {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        self.heap.push(Reverse(Entry {
            deadline,
            seq: self.next_id,
            id,
            kind,
        }));
        id
    }

    pub fn cancel(&mut self, id: TaskId) {
        self.cancelled.insert(id);
    }

    /// Deadline of the earliest live task, pruning cancelled ones.
    pub fn next_deadline(&mut self) -> Option<Timestamp> {
        loop {
            let (id, deadline) = {
                let Reverse(entry) = self.heap.peek()?;
                (entry.id, entry.deadline)
            };
            if self.cancelled.contains(&id) {
                self.heap.pop();
                self.cancelled.remove(&id);
                continue;
            }
            return Some(deadline);
        }
    }

    /// Pop the earliest task due at or before `now`, if any.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(TaskId, TaskKind)> {
        loop {
            let due = self
                .heap
                .peek()
                .is_some_and(|Reverse(entry)| entry.deadline <= now);
            if !due {
                return None;
            }
            let Reverse(entry) = self.heap.pop()?;
            if self.cancelled.remove(&entry.id) {
                continue;
            }
            return Some((entry.id, entry.kind));
        }
    }

    pub fn is_empty(&mut self) -> bool {
        self.next_deadline().is_none()
    }
}
