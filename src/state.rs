//! Shared flags coordinating capture and replay.
//!
//! Capture and replay run on different threads and never lock. They agree
//! on what to do through four atomic flags:
//!
//! - `running`: cleared once to shut everything down.
//! - `replaying`: set by the replay engine for the duration of each drain
//!   cycle. Producers ignore every event while it is set, which keeps the
//!   engine's own synthesized input from being captured again.
//! - `blocked`: user-toggled master switch. While set, producers forward
//!   events without queueing them.
//! - `profiling`: enables throughput reporting in the replay engine.

use std::sync::atomic::{AtomicBool, Ordering};

/// Process-scoped flags shared by the capture context and the replay engine.
#[derive(Debug)]
pub struct SharedState {
    running: AtomicBool,
    replaying: AtomicBool,
    blocked: AtomicBool,
    profiling: AtomicBool,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(false, false)
    }
}

impl SharedState {
    /// Create the flags in the running state.
    pub fn new(blocked: bool, profiling: bool) -> Self {
        Self {
            running: AtomicBool::new(true),
            replaying: AtomicBool::new(false),
            blocked: AtomicBool::new(blocked),
            profiling: AtomicBool::new(profiling),
        }
    }

    /// Whether the pipeline should keep running.
    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Request shutdown. Returns `true` if this call performed the transition.
    #[inline]
    pub fn request_shutdown(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }

    /// Whether the replay engine is currently injecting.
    #[inline]
    pub fn is_replaying(&self) -> bool {
        self.replaying.load(Ordering::Acquire)
    }

    /// Open or close the suppression gate. Only the replay engine calls this.
    #[inline]
    pub fn set_replaying(&self, replaying: bool) {
        self.replaying.store(replaying, Ordering::Release);
    }

    /// Whether capture is blocked by the master switch.
    #[inline]
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Flip the master switch and return the new value.
    #[inline]
    pub fn toggle_blocked(&self) -> bool {
        !self.blocked.fetch_xor(true, Ordering::AcqRel)
    }

    /// Whether throughput reporting is enabled.
    #[inline]
    pub fn is_profiling(&self) -> bool {
        self.profiling.load(Ordering::Acquire)
    }

    /// Flip throughput reporting and return the new value.
    #[inline]
    pub fn toggle_profiling(&self) -> bool {
        !self.profiling.fetch_xor(true, Ordering::AcqRel)
    }

    /// Whether producers must ignore incoming events.
    #[inline]
    pub fn is_suppressed(&self) -> bool {
        self.is_replaying() || self.is_blocked()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = SharedState::default();
        assert!(state.is_running());
        assert!(!state.is_replaying());
        assert!(!state.is_blocked());
        assert!(!state.is_profiling());
        assert!(!state.is_suppressed());

        let seeded = SharedState::new(true, true);
        assert!(seeded.is_blocked());
        assert!(seeded.is_profiling());
    }

    #[test]
    fn test_toggles_return_new_value() {
        let state = SharedState::default();
        assert!(state.toggle_blocked());
        assert!(state.is_blocked());
        assert!(state.is_suppressed());
        assert!(!state.toggle_blocked());
        assert!(!state.is_suppressed());

        assert!(state.toggle_profiling());
        assert!(!state.toggle_profiling());
    }

    #[test]
    fn test_profiling_toggle_seen_across_threads() {
        let state = std::sync::Arc::new(SharedState::default());
        let toggler = std::sync::Arc::clone(&state);
        let turned_on = std::thread::spawn(move || toggler.toggle_profiling())
            .join()
            .unwrap();

        assert!(turned_on);
        assert!(state.is_profiling());
    }

    #[test]
    fn test_replaying_gate() {
        let state = SharedState::default();
        state.set_replaying(true);
        assert!(state.is_suppressed());
        state.set_replaying(false);
        assert!(!state.is_suppressed());
    }

    #[test]
    fn test_shutdown_transitions_once() {
        let state = SharedState::default();
        assert!(state.request_shutdown());
        assert!(!state.is_running());
        assert!(!state.request_shutdown());
    }
}
