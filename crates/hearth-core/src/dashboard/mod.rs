//! Top-level dashboard context.
//!
//! Owns the navigation manager, the inactivity timer and the injected
//! collaborators, and routes every normalized input through the fixed
//! priority order:
//!
//! 1. `sleep-toggle`, always
//! 2. any input while asleep only wakes the display
//! 3. an open overlay gets everything
//! 4. a focused widget gets the widget-aware handlers
//! 5. otherwise the grid and sidebar handlers


use std::time::Instant;

use serde_json::Value;

use crate::config::HearthConfig;
use crate::error::Result;
use crate::input::{Action, InputEvent, TapTarget};
use crate::keymap;
use crate::layout::PageLayout;
use crate::messenger::{HostMessage, Theme, WidgetMessage, WidgetMessenger, WidgetTransport};
use crate::navigation::{NavigationManager, ShellRequest};
use crate::services::{HostShell, OverlayController, SleepController};
use crate::state::DashboardState;
use crate::storage::{KeyValueStore, THEME_KEY};
use crate::timer::TimerManager;
use crate::view::{DashboardView, Surface};

/// Everything the dashboard drives but does not implement.
pub struct Collaborators {
    pub transport: Box<dyn WidgetTransport>,
    pub surface: Box<dyn Surface>,
    pub overlay: Box<dyn OverlayController>,
    pub sleep: Box<dyn SleepController>,
    pub shell: Box<dyn HostShell>,
}

/// Second half of a timeout, due after the grace delay.
#[derive(Debug, Clone, Copy)]
struct PendingDefocus {
    at: Instant,
    generation: u64,
}

/// A routed input after normalization.
#[derive(Debug, Clone, PartialEq)]
enum Routed {
    Action(Action),
    Tap(TapTarget),
    /// A widget asked for focus (touch inside its frame).
    Focus(String),
}

pub struct Dashboard {
    nav: NavigationManager,
    timer: TimerManager,
    overlay: Box<dyn OverlayController>,
    sleep: Box<dyn SleepController>,
    shell: Box<dyn HostShell>,
    theme: Theme,
    pending: Option<PendingDefocus>,
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("nav", &self.nav)
            .field("timer", &self.timer)
            .field("theme", &self.theme)
            .field("pending", &self.pending)
            .finish()
    }
}

impl Dashboard {
    pub fn new(
        config: &HearthConfig,
        layout: PageLayout,
        store: Box<dyn KeyValueStore>,
        parts: Collaborators,
    ) -> Result<Self> {
        let theme = load_theme(store.as_ref());
        let messenger = WidgetMessenger::new(parts.transport, &config.messaging.target_origin);
        let mut nav = NavigationManager::new(layout, store, messenger, parts.surface)?;
        nav.messenger_mut()
            .set_state_entry("theme", serde_json::to_value(theme)?);
        nav.render();
        log::info!(
            "Dashboard ready: {} page(s), theme {theme}",
            nav.pages().pages().len()
        );
        Ok(Self {
            nav,
            timer: TimerManager::new(&config.timeouts),
            overlay: parts.overlay,
            sleep: parts.sleep,
            shell: parts.shell,
            theme,
            pending: None,
        })
    }

    pub fn navigation(&self) -> &NavigationManager {
        &self.nav
    }

    pub fn navigation_mut(&mut self) -> &mut NavigationManager {
        &mut self.nav
    }

    /// Snapshot of the dashboard aggregate.
    pub fn state(&self) -> DashboardState {
        self.nav.snapshot()
    }

    pub fn view(&self) -> DashboardView {
        self.nav.view()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// The next instant [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.timer.deadline(), self.pending.map(|p| p.at)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    // -- input -------------------------------------------------------------

    /// Handle a raw input event. Returns whether it was consumed.
    pub fn handle_event(&mut self, event: &InputEvent, now: Instant) -> bool {
        match event {
            InputEvent::Tap(target) => self.route(Routed::Tap(*target), now),
            other => match keymap::normalize(other) {
                Some(action) => self.route(Routed::Action(action), now),
                None => false,
            },
        }
    }

    /// Handle an already normalized action.
    pub fn dispatch(&mut self, action: Action, now: Instant) -> bool {
        self.route(Routed::Action(action), now)
    }

    fn route(&mut self, input: Routed, now: Instant) -> bool {
        self.nav.note_input();

        if input == Routed::Action(Action::SleepToggle) {
            self.sleep.toggle();
            if self.sleep.is_asleep() {
                self.timer.stop();
            } else {
                self.timer.reset(now, self.nav.state_mut());
                self.nav.render();
            }
            return true;
        }

        if self.sleep.is_asleep() {
            log::info!("Input while asleep, waking display");
            self.sleep.wake();
            self.timer.reset(now, self.nav.state_mut());
            self.nav.render();
            return true;
        }

        let woke = self.timer.reset(now, self.nav.state_mut());
        let handled = if self.overlay.is_open() {
            self.route_overlay(&input)
        } else {
            match input {
                Routed::Action(action) => {
                    if self.nav.state().focused_widget_id().is_some() {
                        self.nav.handle_widget_action(action)
                    } else {
                        self.nav.handle_grid_action(action)
                    }
                },
                Routed::Tap(TapTarget::Cell { row, col }) => self.nav.tap_cell(row, col),
                Routed::Tap(TapTarget::MenuItem(index)) => self.nav.tap_menu_item(index),
                Routed::Tap(TapTarget::Backdrop) => self.nav.tap_backdrop(),
                Routed::Focus(widget_id) => self.nav.focus_widget(&widget_id),
            }
        };
        self.run_requests();
        self.rearm(now);
        if woke && !handled {
            self.nav.render();
        }
        handled || woke
    }

    fn route_overlay(&mut self, input: &Routed) -> bool {
        let Routed::Action(action) = input else {
            return false;
        };
        if let Some(dir) = action.direction() {
            return self.overlay.handle_directional(dir);
        }
        match action {
            Action::Enter | Action::Space => self.overlay.handle_enter(),
            Action::Escape => self.overlay.handle_escape(),
            _ => false,
        }
    }

    fn run_requests(&mut self) {
        for request in self.nav.take_requests() {
            log::debug!("Running {request:?}");
            match request {
                ShellRequest::Reload => self.shell.reload(),
                ShellRequest::Sleep => self.sleep.sleep(),
                ShellRequest::OpenSettings(path) => self.overlay.open_settings(path.as_deref()),
                ShellRequest::ConfirmExit => self.overlay.open_exit_confirmation(),
            }
        }
    }

    /// Match the timer to the post-input state.
    fn rearm(&mut self, now: Instant) {
        if self.nav.state().is_idle() || self.sleep.is_asleep() {
            self.timer.stop();
        } else {
            let focused = self.nav.state().focused_widget_id().is_some();
            self.timer.start(now, focused);
        }
    }

    // -- time --------------------------------------------------------------

    /// Run whatever timer work is due at `now`.
    pub fn tick(&mut self, now: Instant) {
        if let Some(pending) = self.pending.filter(|p| now >= p.at) {
            self.pending = None;
            if !self.nav.finish_timeout(pending.generation) && !self.timer.is_pending() {
                self.rearm(now);
            }
        }
        if self.timer.poll(now) {
            log::debug!("Inactivity timeout");
            match self.nav.begin_timeout() {
                Some(generation) => {
                    self.pending = Some(PendingDefocus {
                        at: now + self.timer.grace(),
                        generation,
                    });
                },
                None => self.nav.go_idle(),
            }
        }
    }

    // -- widgets -----------------------------------------------------------

    /// Validate and act on a message from a widget frame.
    ///
    /// A frame only speaks for itself: a payload naming another widget is
    /// rejected. Transitions a widget causes do not count as user input, so
    /// they never cancel a pending timeout.
    pub fn handle_widget_message(&mut self, source: &str, raw: &Value, now: Instant) -> bool {
        let Some(message) = self.nav.messenger().receive(source, raw) else {
            return false;
        };
        let timeout_live = self
            .pending
            .is_some_and(|p| p.generation == self.nav.generation());
        let handled = match message {
            WidgetMessage::WidgetReady { widget } => {
                let Some(id) = own_id(source, widget) else {
                    return false;
                };
                log::info!("Widget '{id}' ready");
                let messenger = self.nav.messenger_mut();
                messenger.mark_ready(&id);
                messenger.push_state(&id, true);
                true
            },
            WidgetMessage::WidgetError { error, details } => {
                match details {
                    Some(details) => log::error!("Widget '{source}' error: {error} ({details})"),
                    None => log::error!("Widget '{source}' error: {error}"),
                }
                true
            },
            WidgetMessage::ReturnToMenu => self.nav.return_to_menu(source),
            WidgetMessage::WidgetConfig { widget, focus_menu } => {
                let Some(id) = own_id(source, widget) else {
                    return false;
                };
                match focus_menu {
                    Some(raw) => self.nav.register_widget_menu_value(&id, &raw),
                    None => true,
                }
            },
            WidgetMessage::SettingsRequested { path } => {
                self.overlay.open_settings(path.as_deref());
                true
            },
            WidgetMessage::DataRequested { data_type } => {
                log::debug!("'{source}' requested {data_type}");
                self.nav.messenger_mut().push_state(source, true);
                true
            },
            WidgetMessage::Event { widget_id, payload } => {
                let Some(id) = own_id(source, widget_id) else {
                    return false;
                };
                return match payload.event_type.as_str() {
                    // A touch inside the frame is user input.
                    "enter-focus" => self.route(Routed::Focus(id), now),
                    other => {
                        log::debug!("Unhandled '{other}' event from '{source}'");
                        false
                    },
                };
            },
        };
        if timeout_live && let Some(pending) = self.pending.as_mut() {
            pending.generation = self.nav.generation();
        }
        handled
    }

    /// Persist the theme and tell every widget. Returns the number of
    /// widgets reached.
    pub fn set_theme(&mut self, theme: Theme) -> usize {
        self.theme = theme;
        match serde_json::to_string(&theme) {
            Ok(text) => {
                if let Err(e) = self.nav.state_mut().store_mut().set(THEME_KEY, &text) {
                    log::warn!("Failed to persist theme: {e}");
                }
            },
            Err(e) => log::warn!("Failed to encode theme: {e}"),
        }
        let messenger = self.nav.messenger_mut();
        if let Ok(value) = serde_json::to_value(theme) {
            messenger.set_state_entry("theme", value);
        }
        log::info!("Theme set to {theme}");
        messenger.broadcast(HostMessage::ThemeChange {
            theme,
            theme_class: theme.class().to_string(),
        })
    }

    /// Merge one aggregated-state entry and push it to every widget whose
    /// copy is stale.
    pub fn update_state(&mut self, key: &str, value: Value) -> usize {
        self.nav.messenger_mut().set_state_entry(key, value);
        self.publish_state()
    }

    pub fn publish_state(&mut self) -> usize {
        self.nav.messenger_mut().publish_state()
    }
}

/// The widget id a message speaks for: always its source frame.
fn own_id(source: &str, claimed: Option<String>) -> Option<String> {
    match claimed {
        Some(id) if id != source => {
            log::warn!("Dropping message from '{source}' on behalf of '{id}'");
            None
        },
        _ => Some(source.to_string()),
    }
}

fn load_theme(store: &dyn KeyValueStore) -> Theme {
    match store.get(THEME_KEY) {
        Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_else(|e| {
            log::warn!("Ignoring stored theme {text:?}: {e}");
            Theme::default()
        }),
        Ok(None) => Theme::default(),
        Err(e) => {
            log::warn!("Failed to read theme: {e}");
            Theme::default()
        },
    }
}
