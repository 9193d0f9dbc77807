//! Hearth headless host.
//!
//! Drives the dashboard engine from a line protocol on stdin (see
//! `commands`) and reports widget posts, renders, overlays and reloads as
//! JSON lines on stdout for a browser bridge to apply. The engine itself
//! stays on the main thread; a reader thread only forwards stdin lines.
//! The config file comes from the first argument or `HEARTH_CONFIG`.
//! Frames get no posts until the bridge relays their `widget-ready`.

mod commands;
mod host;

use std::cell::Cell;
use std::io::BufRead;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use hearth_core::config::HearthConfig;
use hearth_core::layout::PageLayout;
use hearth_core::services::SleepSwitch;
use hearth_core::state::DashboardState;
use hearth_core::storage::{FileStore, KeyValueStore, MemoryStore};
use hearth_core::view::DashboardView;
use hearth_core::{Collaborators, Dashboard};

use commands::Command;
use host::{BridgeOverlay, BridgeShell, BridgeSurface, BridgeTransport, Output};

#[derive(Serialize)]
struct Snapshot<'a> {
    event: &'static str,
    view: &'a DashboardView,
    state: &'a DashboardState,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let layout = match &config.layout.pages {
        Some(path) => PageLayout::load(path)
            .with_context(|| format!("loading page layout {}", path.display()))?,
        None => PageLayout::builtin()?,
    };
    let store: Box<dyn KeyValueStore> = match &config.storage.dir {
        Some(dir) => {
            log::info!("Persisting to {}", dir.display());
            Box::new(FileStore::open(dir)?)
        },
        None => Box::new(MemoryStore::new()),
    };

    let out = Output::Stdout;
    let quit = Rc::new(Cell::new(false));
    let parts = Collaborators {
        transport: Box::new(BridgeTransport::new(out.clone())),
        surface: Box::new(BridgeSurface::new(out.clone())),
        overlay: Box::new(BridgeOverlay::new(out.clone(), Rc::clone(&quit))),
        sleep: Box::new(SleepSwitch::new()),
        shell: Box::new(BridgeShell::new(out.clone())),
    };
    let mut dashboard = Dashboard::new(&config, layout, store, parts)?;

    let lines = spawn_stdin_reader();
    while !quit.get() {
        let now = Instant::now();
        dashboard.tick(now);
        let received = match dashboard.next_deadline() {
            Some(at) => lines.recv_timeout(at.saturating_duration_since(now)),
            None => lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        let line = match received {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        match commands::parse(&line) {
            Ok(Some(Command::Quit)) => break,
            Ok(Some(cmd)) => execute(&mut dashboard, cmd, &out),
            Ok(None) => {},
            Err(e) => log::warn!("{e:#}"),
        }
    }

    log::info!("Shutting down");
    Ok(())
}

/// Config path from argv, then `HEARTH_CONFIG`.
fn config_path() -> Option<PathBuf> {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HEARTH_CONFIG").ok())
        .map(PathBuf::from)
}

fn load_config() -> Result<HearthConfig> {
    match config_path() {
        Some(path) => {
            let config = HearthConfig::load(&path)
                .with_context(|| format!("loading config {}", path.display()))?;
            log::info!("Loaded config from {}", path.display());
            Ok(config)
        },
        None => {
            log::info!("No config given, using defaults");
            Ok(HearthConfig::default())
        },
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                },
                Err(e) => {
                    log::warn!("stdin read failed: {e}");
                    break;
                },
            }
        }
    });
    rx
}

fn execute(dashboard: &mut Dashboard, cmd: Command, out: &Output) {
    let now = Instant::now();
    match cmd {
        Command::Input(event) => {
            if !dashboard.handle_event(&event, now) {
                log::debug!("Unhandled {event:?}");
            }
        },
        Command::Action(action) => {
            if !dashboard.dispatch(action, now) {
                log::debug!("Unhandled action {action}");
            }
        },
        Command::Message { widget, payload } => {
            dashboard.handle_widget_message(&widget, &payload, now);
        },
        Command::Theme(theme) => {
            dashboard.set_theme(theme);
        },
        Command::State { key, value } => {
            let pushed = dashboard.update_state(&key, value);
            log::debug!("State '{key}' pushed to {pushed} widget(s)");
        },
        Command::Show => {
            let view = dashboard.view();
            let state = dashboard.state();
            out.emit(&Snapshot {
                event: "snapshot",
                view: &view,
                state: &state,
            });
        },
        Command::Quit => {},
    }
}
