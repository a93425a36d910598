//! Burst suppression for mutation events.

use crate::timing::Timestamp;
use std::time::Duration;

/// Rolling-window admission gate for subtree-modified processing.
///
/// Naive mutation observation fires many events per page update; this
/// bounds the work per window, trading completeness of live-region
/// announcements for responsiveness during editor-style render loops.
#[derive(Debug)]
pub struct BurstGate {
    window: Duration,
    max: u32,
    window_start: Option<Timestamp>,
    count: u32,
}

impl BurstGate {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max,
            window_start: None,
            count: 0,
        }
    }

    /// Whether this event may be processed. Starts a new burst when the
    /// previous one began a full window ago.
    pub fn allow(&mut self, now: Timestamp) -> bool {
        match self.window_start {
            Some(start) if now - start < self.window => {
                self.count = self.count.saturating_add(1);
                self.count <= self.max
            }
            _ => {
                self.window_start = Some(now);
                self.count = 1;
                true
            }
        }
    }

    /// Events admitted in the current burst.
    pub const fn current_count(&self) -> u32 {
        self.count
    }
}
