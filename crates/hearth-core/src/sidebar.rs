//! Sidebar menu -- the vertical list opened by moving left off the grid.
//!
//! Holds one content item per page plus the fixed system items. Selection
//! wraps over enabled items only.

use crate::layout::PageConfig;

/// Action performed when a sidebar item is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    /// Show the page with this id.
    ShowPage(String),
    /// Full page reload.
    Reload,
    /// Put the display to sleep.
    Sleep,
    /// Open the settings overlay.
    Settings,
    /// Ask for exit confirmation.
    Exit,
}

/// A single sidebar entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarItem {
    pub id: String,
    pub label: String,
    pub action: SidebarAction,
    pub enabled: bool,
}

impl SidebarItem {
    fn new(id: &str, label: &str, action: SidebarAction) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            action,
            enabled: true,
        }
    }
}

/// The sidebar's item list.
#[derive(Debug, Clone)]
pub struct Sidebar {
    items: Vec<SidebarItem>,
}

impl Sidebar {
    pub fn new(items: Vec<SidebarItem>) -> Self {
        Self { items }
    }

    /// One item per page followed by reload, sleep, settings and exit.
    pub fn default_items(pages: &[PageConfig]) -> Vec<SidebarItem> {
        let mut items: Vec<SidebarItem> = pages
            .iter()
            .map(|p| {
                let label = if p.label.is_empty() { &p.id } else { &p.label };
                SidebarItem::new(&p.id, label, SidebarAction::ShowPage(p.id.clone()))
            })
            .collect();
        items.push(SidebarItem::new("reload", "Reload", SidebarAction::Reload));
        items.push(SidebarItem::new("sleep", "Sleep", SidebarAction::Sleep));
        items.push(SidebarItem::new("settings", "Settings", SidebarAction::Settings));
        items.push(SidebarItem::new("exit", "Exit", SidebarAction::Exit));
        items
    }

    pub fn items(&self) -> &[SidebarItem] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&SidebarItem> {
        self.items.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.id == id)
    }

    pub fn set_enabled(&mut self, id: &str, enabled: bool) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.enabled = enabled;
        }
    }

    /// Index of the next enabled item after (`forward`) or before `from`,
    /// wrapping around. `None` when nothing is enabled.
    pub fn step(&self, from: usize, forward: bool) -> Option<usize> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }
        let from = from.min(n - 1);
        (1..=n)
            .map(|k| if forward { (from + k) % n } else { (from + n - k) % n })
            .find(|&i| self.items[i].enabled)
    }
}
