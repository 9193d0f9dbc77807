//! Inactivity timer.
//!
//! One deadline at most. The host polls it with the current instant, so
//! expiry is deterministic and testable without a runtime. The expiry
//! sequence itself (escape, grace delay, defocus, idle) is run by the
//! dashboard because it needs the navigation manager.

use std::time::{Duration, Instant};

use crate::config::TimeoutConfig;
use crate::state::StateManager;

#[derive(Debug, Clone)]
pub struct TimerManager {
    selection: Duration,
    focus: Duration,
    grace: Duration,
    deadline: Option<Instant>,
}

impl TimerManager {
    pub fn new(config: &TimeoutConfig) -> Self {
        Self {
            selection: config.selection(),
            focus: config.focus(),
            grace: config.grace(),
            deadline: None,
        }
    }

    /// Arm the timer, replacing any pending deadline. A focused widget
    /// gets the longer focus timeout.
    pub fn start(&mut self, now: Instant, widget_focused: bool) {
        let duration = if widget_focused { self.focus } else { self.selection };
        self.deadline = Some(now + duration);
    }

    pub fn stop(&mut self) {
        self.deadline = None;
    }

    /// Called by every input handler. Wakes the highlight if the display
    /// was idle, then restarts the countdown. Returns whether it woke.
    pub fn reset(&mut self, now: Instant, state: &mut StateManager) -> bool {
        let woke = state.is_idle();
        if woke {
            log::debug!("Input while idle, restoring highlight");
            state.set_idle(false);
        }
        self.start(now, state.focused_widget_id().is_some());
        woke
    }

    /// `true` once when the deadline has passed; the timer is then disarmed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            },
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Delay between the timeout escape and the host-side defocus.
    pub fn grace(&self) -> Duration {
        self.grace
    }
}
