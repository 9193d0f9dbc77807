//! Focus menus: the optional action/view strip a widget exposes once focused.
//!
//! Widgets register their menu with a `widget-config` message. The registry
//! validates the shape and keeps the last valid configuration per widget; a
//! malformed registration leaves the previous one in place.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What selecting a menu item does inside the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuItemKind {
    /// One-shot command.
    Action,
    /// Switches the widget's current view.
    View,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: MenuItemKind,
}

/// A widget's focus menu as registered over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuConfig {
    pub enabled: bool,
    #[serde(default)]
    pub items: Vec<MenuItem>,
    #[serde(default)]
    pub default_index: usize,
    /// Id of the view item presently active, for highlighting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_view: Option<String>,
}

impl MenuConfig {
    /// Check the structural rules. Returns the first violation.
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.items.is_empty() {
            return Err("enabled menu has no items".into());
        }
        if let Some(item) = self.items.iter().find(|i| i.id.is_empty()) {
            return Err(format!("menu item '{}' has an empty id", item.label));
        }
        if self.default_index >= self.items.len() {
            return Err(format!(
                "defaultIndex {} out of range for {} items",
                self.default_index,
                self.items.len()
            ));
        }
        Ok(())
    }

    pub fn item(&self, index: usize) -> Option<&MenuItem> {
        self.items.get(index)
    }
}

/// Per-widget cache of registered focus menus.
#[derive(Debug, Default)]
pub struct FocusMenuRegistry {
    menus: HashMap<String, MenuConfig>,
}

impl FocusMenuRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a menu. Returns `false` without mutating on
    /// invalid input.
    pub fn register(&mut self, widget_id: &str, config: MenuConfig) -> bool {
        if widget_id.is_empty() {
            log::warn!("Focus menu registration without a widget id");
            return false;
        }
        if let Err(reason) = config.validate() {
            log::warn!("Rejected focus menu for '{widget_id}': {reason}");
            return false;
        }
        log::debug!(
            "Registered focus menu for '{widget_id}' ({} items, enabled={})",
            config.items.len(),
            config.enabled
        );
        self.menus.insert(widget_id.to_string(), config);
        true
    }

    /// Parse a raw `focusMenu` payload, then [`register`](Self::register) it.
    pub fn register_value(&mut self, widget_id: &str, raw: &Value) -> bool {
        match serde_json::from_value::<MenuConfig>(raw.clone()) {
            Ok(config) => self.register(widget_id, config),
            Err(e) => {
                log::warn!("Rejected focus menu for '{widget_id}': {e}");
                false
            },
        }
    }

    /// The enabled menu for a widget, if any.
    pub fn menu_for(&self, widget_id: &str) -> Option<&MenuConfig> {
        self.menus.get(widget_id).filter(|m| m.enabled)
    }
}
