//! Collaborators for the headless host: everything the dashboard emits
//! becomes one JSON line on stdout for the bridge process to act on.

use std::cell::Cell;
#[cfg(test)]
use std::cell::RefCell;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use hearth_core::error::Result;
use hearth_core::input::Direction;
use hearth_core::messenger::WidgetTransport;
use hearth_core::services::{HostShell, OverlayController};
use hearth_core::view::{DashboardView, Surface};

/// Line sink shared by every collaborator.
#[derive(Clone)]
pub enum Output {
    Stdout,
    #[cfg(test)]
    Capture(Rc<RefCell<Vec<String>>>),
}

impl Output {
    pub fn emit<T: Serialize>(&self, record: &T) {
        let line = match serde_json::to_string(record) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Failed to encode output record: {e}");
                return;
            },
        };
        match self {
            Self::Stdout => println!("{line}"),
            #[cfg(test)]
            Self::Capture(lines) => lines.borrow_mut().push(line),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum Record<'a> {
    Post {
        widget: &'a str,
        origin: &'a str,
        message: &'a Value,
    },
    Render {
        view: &'a DashboardView,
    },
    Reload,
    Overlay {
        state: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<&'a str>,
    },
}

/// Widget frames live in the bridge; posts are handed to it verbatim.
pub struct BridgeTransport {
    out: Output,
}

impl BridgeTransport {
    pub fn new(out: Output) -> Self {
        Self { out }
    }
}

impl WidgetTransport for BridgeTransport {
    fn post(&mut self, widget_id: &str, message: &Value, target_origin: &str) -> Result<()> {
        self.out.emit(&Record::Post {
            widget: widget_id,
            origin: target_origin,
            message,
        });
        Ok(())
    }
}

/// Emits a render record whenever the view changes.
pub struct BridgeSurface {
    out: Output,
    last: Option<DashboardView>,
}

impl BridgeSurface {
    pub fn new(out: Output) -> Self {
        Self { out, last: None }
    }
}

impl Surface for BridgeSurface {
    fn render(&mut self, view: &DashboardView) {
        if self.last.as_ref() == Some(view) {
            return;
        }
        self.out.emit(&Record::Render { view });
        self.last = Some(view.clone());
    }
}

pub struct BridgeShell {
    out: Output,
}

impl BridgeShell {
    pub fn new(out: Output) -> Self {
        Self { out }
    }
}

impl HostShell for BridgeShell {
    fn reload(&mut self) {
        log::info!("Reload requested");
        self.out.emit(&Record::Reload);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OverlayKind {
    Settings,
    ExitConfirm,
}

/// Settings overlay and exit confirmation. Settings content is drawn by the
/// bridge; this side only tracks which overlay holds input. Confirming the
/// exit dialog raises the shared quit flag.
pub struct BridgeOverlay {
    out: Output,
    open: Option<OverlayKind>,
    quit: Rc<Cell<bool>>,
}

impl BridgeOverlay {
    pub fn new(out: Output, quit: Rc<Cell<bool>>) -> Self {
        Self {
            out,
            open: None,
            quit,
        }
    }

    fn close(&mut self) {
        self.open = None;
        self.out.emit(&Record::Overlay {
            state: "closed",
            path: None,
        });
    }
}

impl OverlayController for BridgeOverlay {
    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn handle_directional(&mut self, dir: Direction) -> bool {
        log::debug!("Overlay {:?} got {dir:?}", self.open);
        self.open.is_some()
    }

    fn handle_enter(&mut self) -> bool {
        match self.open {
            Some(OverlayKind::ExitConfirm) => {
                log::info!("Exit confirmed");
                self.quit.set(true);
                self.close();
                true
            },
            Some(OverlayKind::Settings) => true,
            None => false,
        }
    }

    fn handle_escape(&mut self) -> bool {
        if self.open.is_none() {
            return false;
        }
        self.close();
        true
    }

    fn open_settings(&mut self, path: Option<&str>) {
        self.open = Some(OverlayKind::Settings);
        self.out.emit(&Record::Overlay {
            state: "settings",
            path,
        });
    }

    fn open_exit_confirmation(&mut self) {
        self.open = Some(OverlayKind::ExitConfirm);
        self.out.emit(&Record::Overlay {
            state: "exit-confirm",
            path: None,
        });
    }
}
