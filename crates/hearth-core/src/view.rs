//! What a rendering surface needs to draw after each transition.

use serde::Serialize;

use crate::focus_menu::MenuItem;
use crate::layout::GridPosition;

/// Flattened render model built from the navigation state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub page_id: String,
    pub page_index: usize,
    pub page_count: usize,
    /// Highlighted grid cell. `None` while idle, or while the sidebar or a
    /// widget owns input.
    pub highlighted: Option<GridPosition>,
    pub focused_widget: Option<FocusedView>,
    pub sidebar: Option<SidebarView>,
    pub idle: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusedView {
    pub widget_id: String,
    /// Zoom to apply; `None` for widgets excluded from centering.
    pub scale: Option<f32>,
    pub menu: Option<FocusMenuView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusMenuView {
    pub items: Vec<MenuItem>,
    pub selected: usize,
    pub current_view: Option<String>,
    /// The cursor is inside the widget; the menu is drawn dimmed.
    pub dimmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarView {
    pub items: Vec<SidebarEntryView>,
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SidebarEntryView {
    pub id: String,
    pub label: String,
    pub enabled: bool,
}

/// Anything that draws the dashboard.
pub trait Surface {
    fn render(&mut self, view: &DashboardView);
}
