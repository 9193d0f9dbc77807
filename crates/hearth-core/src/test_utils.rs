//! Shared test doubles.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{HearthError, Result};
use crate::input::Direction;
use crate::messenger::WidgetTransport;
use crate::navigation::NavigationManager;
use crate::services::{HostShell, OverlayController, SleepController};
use crate::view::{DashboardView, Surface};

/// Transport that records every envelope. Clones share the log.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Rc<RefCell<Vec<(String, Value, String)>>>,
    failing: Rc<RefCell<HashSet<String>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every post to `widget_id` fail.
    pub fn fail_for(&self, widget_id: &str) {
        self.failing.borrow_mut().insert(widget_id.to_string());
    }

    pub fn sent_to(&self, widget_id: &str) -> Vec<Value> {
        self.sent
            .borrow()
            .iter()
            .filter(|(id, _, _)| id == widget_id)
            .map(|(_, v, _)| v.clone())
            .collect()
    }

    /// Just the `action` tags sent to `widget_id`, in order.
    pub fn actions_to(&self, widget_id: &str) -> Vec<String> {
        self.sent_to(widget_id)
            .iter()
            .filter_map(|v| v["action"].as_str().map(str::to_string))
            .collect()
    }

    pub fn origins(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|(_, _, o)| o.clone()).collect()
    }

    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl WidgetTransport for RecordingTransport {
    fn post(&mut self, widget_id: &str, message: &Value, target_origin: &str) -> Result<()> {
        if self.failing.borrow().contains(widget_id) {
            return Err(HearthError::Transport(format!("no frame for '{widget_id}'")));
        }
        self.sent.borrow_mut().push((
            widget_id.to_string(),
            message.clone(),
            target_origin.to_string(),
        ));
        Ok(())
    }
}

/// Surface that keeps every rendered view.
#[derive(Clone, Default)]
pub struct RecordingSurface {
    views: Rc<RefCell<Vec<DashboardView>>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<DashboardView> {
        self.views.borrow().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.views.borrow().len()
    }
}

impl Surface for RecordingSurface {
    fn render(&mut self, view: &DashboardView) {
        self.views.borrow_mut().push(view.clone());
    }
}

/// Overlay whose open state and received calls are visible to the test.
#[derive(Clone, Default)]
pub struct ScriptedOverlay {
    open: Rc<Cell<bool>>,
    calls: Rc<RefCell<Vec<String>>>,
}

impl ScriptedOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_open(&self, open: bool) {
        self.open.set(open);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl OverlayController for ScriptedOverlay {
    fn is_open(&self) -> bool {
        self.open.get()
    }

    fn handle_directional(&mut self, dir: Direction) -> bool {
        self.record(format!("dir:{dir:?}"));
        true
    }

    fn handle_enter(&mut self) -> bool {
        self.record("enter".into());
        true
    }

    fn handle_escape(&mut self) -> bool {
        self.record("escape".into());
        self.open.set(false);
        true
    }

    fn open_settings(&mut self, path: Option<&str>) {
        self.record(format!("settings:{}", path.unwrap_or("")));
        self.open.set(true);
    }

    fn open_exit_confirmation(&mut self) {
        self.record("exit".into());
        self.open.set(true);
    }
}

/// Sleep flag shared with the test.
#[derive(Clone, Default)]
pub struct SharedSleep {
    asleep: Rc<Cell<bool>>,
}

impl SharedSleep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asleep(&self) -> bool {
        self.asleep.get()
    }

    pub fn set(&self, asleep: bool) {
        self.asleep.set(asleep);
    }
}

impl SleepController for SharedSleep {
    fn is_asleep(&self) -> bool {
        self.asleep.get()
    }

    fn sleep(&mut self) {
        self.asleep.set(true);
    }

    fn wake(&mut self) {
        self.asleep.set(false);
    }
}

/// Shell that counts reloads.
#[derive(Clone, Default)]
pub struct CountingShell {
    reloads: Rc<Cell<usize>>,
}

impl CountingShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reloads(&self) -> usize {
        self.reloads.get()
    }
}

impl HostShell for CountingShell {
    fn reload(&mut self) {
        self.reloads.set(self.reloads.get() + 1);
    }
}

/// Every frame on every page has sent `widget-ready`.
pub fn mark_all_ready(nav: &mut NavigationManager) {
    let ids: Vec<String> = nav.messenger().attached().map(str::to_string).collect();
    for id in &ids {
        nav.messenger_mut().mark_ready(id);
    }
}
