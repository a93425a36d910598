//! Runtime configuration for the event pipeline.
//!
//! Timing windows for coalescing, burst suppression, editable polling and
//! continuous reading. Values can be set programmatically or loaded from
//! `HERALD_*` environment variables.

use core::time::Duration;
use std::env;

/// Tunable timing and capacity knobs.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Coalescing window: flush runs this long after the first buffered
    /// event (and a recent focus event re-arms it once).
    pub wait_ms: u64,
    /// Hard bound: a flush is never deferred past this much time after the
    /// oldest buffered event, no matter how focus keeps arriving.
    pub max_wait_ms: u64,
    /// Rolling window for the subtree-modified burst counter.
    pub burst_window_ms: u64,
    /// Subtree-modified events processed per burst window; the rest drop.
    pub burst_max: u32,
    /// Live regions resolved per mutation event.
    pub live_region_cap: usize,
    /// First editable poll after focus enters a text control.
    pub poll_initial_ms: u64,
    /// Steady-state editable poll interval.
    pub poll_steady_ms: u64,
    /// Pace of continuous reading steps.
    pub read_interval_ms: u64,
    /// Block cursor convention: a one-step cursor move speaks the character
    /// to the right of the new position instead of the crossed one.
    pub block_cursor: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            wait_ms: 10,
            max_wait_ms: 50,
            burst_window_ms: 1000,
            burst_max: 3,
            live_region_cap: 2,
            poll_initial_ms: 10,
            poll_steady_ms: 250,
            read_interval_ms: 200,
            block_cursor: false,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults above:
    /// - `HERALD_WAIT_MS`, `HERALD_MAX_WAIT_MS`
    /// - `HERALD_BURST_WINDOW_MS`, `HERALD_BURST_MAX`
    /// - `HERALD_POLL_MS` (steady-state poll interval)
    /// - `HERALD_BLOCK_CURSOR` ("1" to enable)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let read = |name: &str, fallback: u64| {
            env::var(name)
                .ok()
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(fallback)
                .max(1)
        };
        Self {
            wait_ms: read("HERALD_WAIT_MS", defaults.wait_ms),
            max_wait_ms: read("HERALD_MAX_WAIT_MS", defaults.max_wait_ms),
            burst_window_ms: read("HERALD_BURST_WINDOW_MS", defaults.burst_window_ms),
            burst_max: read("HERALD_BURST_MAX", u64::from(defaults.burst_max)) as u32,
            live_region_cap: defaults.live_region_cap,
            poll_initial_ms: defaults.poll_initial_ms,
            poll_steady_ms: read("HERALD_POLL_MS", defaults.poll_steady_ms),
            read_interval_ms: defaults.read_interval_ms,
            block_cursor: env::var("HERALD_BLOCK_CURSOR").ok().as_deref() == Some("1"),
        }
    }

    pub const fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub const fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    pub const fn burst_window(&self) -> Duration {
        Duration::from_millis(self.burst_window_ms)
    }

    pub const fn poll_initial(&self) -> Duration {
        Duration::from_millis(self.poll_initial_ms)
    }

    pub const fn poll_steady(&self) -> Duration {
        Duration::from_millis(self.poll_steady_ms)
    }

    pub const fn read_interval(&self) -> Duration {
        Duration::from_millis(self.read_interval_ms)
    }
}
