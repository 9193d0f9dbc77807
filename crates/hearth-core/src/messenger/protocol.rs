//! Host <-> widget message schema.
//!
//! Every message is an object with an `action` tag plus auxiliary fields.
//! Both directions also accept a bare action string as shorthand for
//! `{"action": "<string>"}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HearthError, Result};
use crate::input::Direction;

/// Messages the host sends into a widget frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum HostMessage {
    EnterFocus,
    EnterActive,
    ExitActive,
    ExitFocus,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Enter,
    MenuActive {
        #[serde(rename = "selectedItem")]
        selected_item: usize,
        #[serde(rename = "itemId")]
        item_id: String,
    },
    MenuSelectionChanged {
        #[serde(rename = "selectedItem")]
        selected_item: usize,
        #[serde(rename = "itemId")]
        item_id: String,
    },
    MenuItemSelected {
        #[serde(rename = "itemId")]
        item_id: String,
    },
    StateUpdate {
        #[serde(flatten)]
        state: Map<String, Value>,
        timestamp: u64,
    },
    ThemeChange {
        theme: Theme,
        #[serde(rename = "themeClass")]
        theme_class: String,
    },
}

impl HostMessage {
    pub fn direction(dir: Direction) -> Self {
        match dir {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
            Direction::Left => Self::Left,
            Direction::Right => Self::Right,
        }
    }

    /// The `action` tag this message serializes with.
    pub fn action(&self) -> &'static str {
        match self {
            Self::EnterFocus => "enter-focus",
            Self::EnterActive => "enter-active",
            Self::ExitActive => "exit-active",
            Self::ExitFocus => "exit-focus",
            Self::Escape => "escape",
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Enter => "enter",
            Self::MenuActive { .. } => "menu-active",
            Self::MenuSelectionChanged { .. } => "menu-selection-changed",
            Self::MenuItemSelected { .. } => "menu-item-selected",
            Self::StateUpdate { .. } => "state-update",
            Self::ThemeChange { .. } => "theme-change",
        }
    }
}

/// Anything the messenger can send: a typed message or a bare action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Bare(String),
    Message(HostMessage),
}

impl Outbound {
    /// Wire form; a bare action becomes `{"action": ...}`.
    pub fn to_value(&self) -> Result<Value> {
        match self {
            Self::Bare(action) => {
                let mut obj = Map::new();
                obj.insert("action".into(), Value::String(action.clone()));
                Ok(Value::Object(obj))
            },
            Self::Message(msg) => Ok(serde_json::to_value(msg)?),
        }
    }

    pub fn action(&self) -> &str {
        match self {
            Self::Bare(action) => action,
            Self::Message(msg) => msg.action(),
        }
    }
}

impl From<&str> for Outbound {
    fn from(action: &str) -> Self {
        Self::Bare(action.to_string())
    }
}

impl From<String> for Outbound {
    fn from(action: String) -> Self {
        Self::Bare(action)
    }
}

impl From<HostMessage> for Outbound {
    fn from(msg: HostMessage) -> Self {
        Self::Message(msg)
    }
}

/// Messages a widget frame sends to the host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum WidgetMessage {
    WidgetReady {
        #[serde(default)]
        widget: Option<String>,
    },
    WidgetError {
        #[serde(default)]
        error: String,
        #[serde(default)]
        details: Option<Value>,
    },
    ReturnToMenu,
    WidgetConfig {
        #[serde(default)]
        widget: Option<String>,
        #[serde(rename = "focusMenu", default)]
        focus_menu: Option<Value>,
    },
    SettingsRequested {
        #[serde(default)]
        path: Option<String>,
    },
    DataRequested {
        #[serde(rename = "dataType")]
        data_type: String,
    },
    Event {
        #[serde(rename = "widgetId", default)]
        widget_id: Option<String>,
        payload: EventPayload,
    },
}

/// Payload of a generic widget `event`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventPayload {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WidgetMessage {
    /// Validate an untrusted message against the schema.
    pub fn parse(raw: &Value) -> Result<Self> {
        let normalized = match raw {
            Value::String(action) => {
                let mut obj = Map::new();
                obj.insert("action".into(), Value::String(action.clone()));
                Value::Object(obj)
            },
            other => other.clone(),
        };
        serde_json::from_value(normalized)
            .map_err(|e| HearthError::Protocol(format!("invalid widget message: {e}")))
    }
}

/// Display theme shared with every widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// CSS class widgets apply to their root element.
    pub fn class(self) -> &'static str {
        match self {
            Self::Light => "theme-light",
            Self::Dark => "theme-dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Dark => "dark",
        })
    }
}
