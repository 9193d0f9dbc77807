//! The only channel between the host and widget frames.
//!
//! Outbound delivery is fire-and-forget. A frame receives nothing until it
//! reports `widget-ready`; messages to unready or unreachable frames are
//! dropped and logged at debug level.
//! Aggregated state pushes are deduplicated per frame so an unchanged
//! state is never resent.

pub mod protocol;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};

pub use protocol::{EventPayload, HostMessage, Outbound, Theme, WidgetMessage};

use crate::error::Result;

/// Delivery into a widget frame (the cross-document messaging seam).
pub trait WidgetTransport {
    fn post(&mut self, widget_id: &str, message: &Value, target_origin: &str) -> Result<()>;
}

/// Host-side messenger for all widget frames.
pub struct WidgetMessenger {
    transport: Box<dyn WidgetTransport>,
    target_origin: String,
    frames: BTreeSet<String>,
    ready: HashSet<String>,
    /// Last state payload pushed to each frame.
    last_pushed: HashMap<String, String>,
    state: Map<String, Value>,
}

impl std::fmt::Debug for WidgetMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetMessenger")
            .field("target_origin", &self.target_origin)
            .field("frames", &self.frames)
            .field("ready", &self.ready)
            .finish()
    }
}

impl WidgetMessenger {
    pub fn new(transport: Box<dyn WidgetTransport>, target_origin: &str) -> Self {
        Self {
            transport,
            target_origin: target_origin.to_string(),
            frames: BTreeSet::new(),
            ready: HashSet::new(),
            last_pushed: HashMap::new(),
            state: Map::new(),
        }
    }

    /// Start tracking a widget frame.
    pub fn attach(&mut self, widget_id: &str) {
        self.frames.insert(widget_id.to_string());
    }

    /// Forget a frame and everything cached for it.
    pub fn detach(&mut self, widget_id: &str) {
        self.frames.remove(widget_id);
        self.ready.remove(widget_id);
        self.last_pushed.remove(widget_id);
    }

    pub fn attached(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(String::as_str)
    }

    pub fn is_attached(&self, widget_id: &str) -> bool {
        self.frames.contains(widget_id)
    }

    /// Record a `widget-ready`, attaching the frame if needed. A reloaded
    /// frame has lost whatever state it was sent, so its dedup entry is
    /// dropped.
    pub fn mark_ready(&mut self, widget_id: &str) {
        self.frames.insert(widget_id.to_string());
        self.ready.insert(widget_id.to_string());
        self.last_pushed.remove(widget_id);
    }

    pub fn is_ready(&self, widget_id: &str) -> bool {
        self.ready.contains(widget_id)
    }

    /// Send a command to one widget. Returns whether it was handed to the
    /// transport.
    pub fn send(&mut self, widget_id: &str, message: impl Into<Outbound>) -> bool {
        let message = message.into();
        if !self.ready.contains(widget_id) {
            log::debug!("Dropped '{}' to '{widget_id}': frame not ready", message.action());
            return false;
        }
        let value = match message.to_value() {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Dropping unencodable '{}' message: {e}", message.action());
                return false;
            },
        };
        self.post(widget_id, &value)
    }

    /// Send the same command to every attached frame.
    pub fn broadcast(&mut self, message: impl Into<Outbound>) -> usize {
        let message = message.into();
        let ids: Vec<String> = self.frames.iter().cloned().collect();
        ids.iter()
            .filter(|id| self.send(id, message.clone()))
            .count()
    }

    /// Merge one entry of the aggregated state (calendar, photos, weather,
    /// auth, theme, settings...).
    pub fn set_state_entry(&mut self, key: &str, value: Value) {
        self.state.insert(key.to_string(), value);
    }

    pub fn state(&self) -> &Map<String, Value> {
        &self.state
    }

    /// Push the aggregated state to every attached frame whose last push
    /// differs. Returns the number of frames updated.
    pub fn publish_state(&mut self) -> usize {
        let ids: Vec<String> = self.frames.iter().cloned().collect();
        ids.iter().filter(|id| self.push_state(id, false)).count()
    }

    /// Push the aggregated state to one frame; `force` bypasses dedup.
    pub fn push_state(&mut self, widget_id: &str, force: bool) -> bool {
        let key = match serde_json::to_string(&self.state) {
            Ok(k) => k,
            Err(e) => {
                log::warn!("Failed to encode aggregated state: {e}");
                return false;
            },
        };
        if !force && self.last_pushed.get(widget_id) == Some(&key) {
            log::debug!("State unchanged for '{widget_id}', skipping push");
            return false;
        }
        let msg = HostMessage::StateUpdate {
            state: self.state.clone(),
            timestamp: now_millis(),
        };
        if self.send(widget_id, msg) {
            self.last_pushed.insert(widget_id.to_string(), key);
            true
        } else {
            false
        }
    }

    /// Validate an incoming message. Invalid messages are logged and dropped.
    pub fn receive(&self, source: &str, raw: &Value) -> Option<WidgetMessage> {
        match WidgetMessage::parse(raw) {
            Ok(msg) => Some(msg),
            Err(e) => {
                log::warn!("Dropping message from '{source}': {e}");
                None
            },
        }
    }

    fn post(&mut self, widget_id: &str, value: &Value) -> bool {
        match self.transport.post(widget_id, value, &self.target_origin) {
            Ok(()) => {
                log::debug!("-> {widget_id}: {value}");
                true
            },
            Err(e) => {
                log::debug!("Dropped message to '{widget_id}': {e}");
                false
            },
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
