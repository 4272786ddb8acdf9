//! Replay throughput measurement.
//!
//! Purely advisory: the replay engine feeds a [`Throughput`] meter when
//! profiling is enabled and logs a [`ThroughputSample`] once per window.

use std::fmt;
use std::time::{Duration, Instant};

/// Rates measured over one reporting window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThroughputSample {
    /// Engine iterations per second.
    pub iterations_per_sec: f64,
    /// Drained reports per second.
    pub events_per_sec: f64,
    /// Length of the window the rates were measured over.
    pub window: Duration,
}

impl fmt::Display for ThroughputSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} iterations/sec, {:.1} events/sec",
            self.iterations_per_sec, self.events_per_sec
        )
    }
}

/// Counts iterations and events and turns them into rates per window.
#[derive(Debug, Clone)]
pub struct Throughput {
    interval: Duration,
    window_start: Instant,
    iterations: u64,
    events: u64,
}

impl Throughput {
    /// Create a meter reporting every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    /// Create a meter whose first window opens at `start`.
    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            window_start: start,
            iterations: 0,
            events: 0,
        }
    }

    /// Record one engine iteration that drained `events` reports.
    ///
    /// Returns a sample when the current window has elapsed at `now`, and
    /// starts a new window.
    pub fn record(&mut self, events: usize, now: Instant) -> Option<ThroughputSample> {
        self.iterations += 1;
        self.events += events as u64;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval || elapsed.is_zero() {
            return None;
        }

        let secs = elapsed.as_secs_f64();
        let sample = ThroughputSample {
            iterations_per_sec: self.iterations as f64 / secs,
            events_per_sec: self.events as f64 / secs,
            window: elapsed,
        };
        self.reset(now);
        Some(sample)
    }

    /// Discard the current window and open a new one at `now`.
    pub fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.iterations = 0;
        self.events = 0;
    }
}
