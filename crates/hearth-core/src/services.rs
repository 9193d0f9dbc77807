//! Collaborators the dashboard drives but does not own.
//!
//! All of them are resolved when the [`Dashboard`](crate::dashboard::Dashboard)
//! is built and passed in as trait objects.

use crate::input::Direction;

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

/// The settings overlay and the exit-confirmation dialog.
///
/// While [`is_open`](Self::is_open) is true every input is routed here
/// exclusively.
pub trait OverlayController {
    fn is_open(&self) -> bool;

    /// Returns whether the overlay consumed the input.
    fn handle_directional(&mut self, dir: Direction) -> bool;
    fn handle_enter(&mut self) -> bool;
    fn handle_escape(&mut self) -> bool;

    /// Open settings, optionally at a sub-page path.
    fn open_settings(&mut self, path: Option<&str>);
    fn open_exit_confirmation(&mut self);
}

// ---------------------------------------------------------------------------
// Sleep
// ---------------------------------------------------------------------------

/// Display sleep (screen blanking).
pub trait SleepController {
    fn is_asleep(&self) -> bool;
    fn sleep(&mut self);
    fn wake(&mut self);

    fn toggle(&mut self) {
        if self.is_asleep() {
            self.wake();
        } else {
            self.sleep();
        }
    }
}

/// In-process sleep flag for hosts without a real display power switch.
#[derive(Debug, Default)]
pub struct SleepSwitch {
    asleep: bool,
}

impl SleepSwitch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SleepController for SleepSwitch {
    fn is_asleep(&self) -> bool {
        self.asleep
    }

    fn sleep(&mut self) {
        if !self.asleep {
            log::info!("Display sleeping");
            self.asleep = true;
        }
    }

    fn wake(&mut self) {
        if self.asleep {
            log::info!("Display waking");
            self.asleep = false;
        }
    }
}

// ---------------------------------------------------------------------------
// Host shell
// ---------------------------------------------------------------------------

/// Process-level operations of the embedding host.
pub trait HostShell {
    /// Full reload of the dashboard and every widget.
    fn reload(&mut self);
}
