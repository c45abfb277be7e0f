//! Emission mode and the timers that drive it.
//!
//! Time is the frame clock in milliseconds since the loop started.

/// How long a major pulse holds the engine in search mode
pub const SEARCH_MODE_MS: f64 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Typing,
    Search,
}

/// A one-shot deadline owned by a component. Dropping or cancelling it
/// guarantees it never fires.
#[derive(Debug, Default)]
pub struct ScopedTimer {
    deadline: Option<f64>,
}

impl ScopedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer to expire `delay_ms` after `now`
    pub fn arm(&mut self, now: f64, delay_ms: f64) {
        self.deadline = Some(now + delay_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self, now: f64) -> bool {
        matches!(self.deadline, Some(d) if now < d)
    }

    /// Returns true exactly once, on the first call at or after the deadline.
    pub fn fire(&mut self, now: f64) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Resolves the current mode from the host's base mode and the search window.
#[derive(Debug)]
pub struct ModeController {
    base: Mode,
    search_window: ScopedTimer,
    search_started_at: Option<f64>,
}

impl Default for ModeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ModeController {
    pub fn new() -> Self {
        Self {
            base: Mode::Idle,
            search_window: ScopedTimer::new(),
            search_started_at: None,
        }
    }

    /// Host-provided mode outside the search window. `Search` is not a valid base.
    pub fn set_base(&mut self, mode: Mode) {
        if mode != Mode::Search {
            self.base = mode;
        }
    }

    pub fn force_search(&mut self, now: f64) {
        self.search_window.arm(now, SEARCH_MODE_MS);
        self.search_started_at = Some(now);
    }

    /// Current mode; expires the search window when its deadline passes.
    pub fn current(&mut self, now: f64) -> Mode {
        if self.search_window.fire(now) {
            tracing::debug!(now, "search window elapsed, back to {:?}", self.base);
        }
        if self.search_window.is_pending(now) {
            Mode::Search
        } else {
            self.base
        }
    }

    /// Milliseconds since the last search entry, if any
    pub fn search_elapsed(&self, now: f64) -> Option<f64> {
        self.search_started_at.map(|start| now - start)
    }

    pub fn dispose(&mut self) {
        self.search_window.cancel();
        self.search_started_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_fires_once() {
        let mut timer = ScopedTimer::new();
        timer.arm(0.0, 100.0);
        assert!(timer.is_pending(50.0));
        assert!(!timer.fire(99.0));
        assert!(timer.fire(100.0));
        assert!(!timer.fire(200.0));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timer = ScopedTimer::new();
        timer.arm(0.0, 10.0);
        timer.cancel();
        assert!(!timer.is_pending(5.0));
        assert!(!timer.fire(20.0));
    }

    #[test]
    fn search_window_reverts_to_base() {
        let mut modes = ModeController::new();
        modes.set_base(Mode::Typing);
        modes.force_search(1000.0);

        assert_eq!(modes.current(1500.0), Mode::Search);
        assert_eq!(modes.current(1999.0), Mode::Search);
        assert_eq!(modes.current(2000.0), Mode::Typing);
        assert_eq!(modes.search_elapsed(2500.0), Some(1500.0));
    }

    #[test]
    fn search_is_not_a_base_mode() {
        let mut modes = ModeController::new();
        modes.set_base(Mode::Search);
        assert_eq!(modes.current(0.0), Mode::Idle);
    }

    #[test]
    fn dispose_cancels_window() {
        let mut modes = ModeController::new();
        modes.force_search(0.0);
        modes.dispose();
        assert_eq!(modes.current(10.0), Mode::Idle);
        assert_eq!(modes.search_elapsed(10.0), None);
    }
}
