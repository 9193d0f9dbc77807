//! Single source of truth for cursor position, input ownership and idle state.
//!
//! Input ownership is one tagged [`NavMode`], so the sidebar and a focused
//! widget can never hold input at the same time and a focus menu can only
//! exist inside a widget focus. [`DashboardState`] is the flat snapshot
//! readers take; nothing hands out live references across transitions.

use serde::{Deserialize, Serialize};

use crate::focus_menu::MenuConfig;
use crate::layout::GridPosition;
use crate::storage::{DASHBOARD_STATE_KEY, KeyValueStore};

/// A displayed focus menu inside a focused widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMenu {
    pub config: MenuConfig,
    pub selected: usize,
    /// `true` while the menu has the cursor, `false` while the widget does.
    pub in_menu: bool,
}

impl ActiveMenu {
    /// Id of the currently selected item.
    pub fn selected_id(&self) -> Option<&str> {
        self.config.item(self.selected).map(|i| i.id.as_str())
    }
}

/// A widget that owns directional input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetFocus {
    pub widget_id: String,
    pub menu: Option<ActiveMenu>,
}

/// Who currently owns directional input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NavMode {
    #[default]
    Grid,
    Sidebar,
    Widget(WidgetFocus),
}

/// Flat view of the focus-menu sub-state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusMenuState {
    pub active: bool,
    pub widget_id: Option<String>,
    pub menu_config: Option<MenuConfig>,
    pub selected_index: usize,
    pub in_menu: bool,
}

impl FocusMenuState {
    /// The defined-empty shape.
    pub fn empty() -> Self {
        Self {
            active: false,
            widget_id: None,
            menu_config: None,
            selected_index: 0,
            in_menu: true,
        }
    }
}

/// Immutable snapshot of the dashboard aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub grid_position: GridPosition,
    pub focused_widget_id: Option<String>,
    pub menu_open: bool,
    pub selected_menu_item: usize,
    pub is_idle: bool,
    pub focus_menu_state: FocusMenuState,
}

/// Partial update for [`StateManager::set_state`]. Ownership changes go
/// through the typed setters instead.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub grid_position: Option<GridPosition>,
    pub selected_menu_item: Option<usize>,
    pub is_idle: Option<bool>,
}

/// The durable subset.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    #[serde(rename = "selectedMenuItem")]
    selected_menu_item: usize,
}

/// Owner of the dashboard aggregate.
pub struct StateManager {
    position: GridPosition,
    rows: u32,
    cols: u32,
    mode: NavMode,
    selected_menu_item: usize,
    idle: bool,
    store: Box<dyn KeyValueStore>,
    persisted_menu_item: Option<usize>,
}

impl std::fmt::Debug for StateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateManager")
            .field("position", &self.position)
            .field("bounds", &(self.rows, self.cols))
            .field("mode", &self.mode)
            .field("selected_menu_item", &self.selected_menu_item)
            .field("idle", &self.idle)
            .finish()
    }
}

impl StateManager {
    /// Create the aggregate for a `rows` x `cols` page, restoring the
    /// persisted sidebar item. Starts idle at (1, 1).
    pub fn new(store: Box<dyn KeyValueStore>, rows: u32, cols: u32) -> Self {
        let persisted = load_persisted(store.as_ref());
        Self {
            position: GridPosition::default(),
            rows: rows.max(1),
            cols: cols.max(1),
            mode: NavMode::Grid,
            selected_menu_item: persisted.unwrap_or(0),
            idle: true,
            store,
            persisted_menu_item: persisted,
        }
    }

    /// Snapshot copy of the whole aggregate.
    pub fn get_state(&self) -> DashboardState {
        DashboardState {
            grid_position: self.position,
            focused_widget_id: self.focused_widget_id().map(str::to_string),
            menu_open: self.menu_open(),
            selected_menu_item: self.selected_menu_item,
            is_idle: self.idle,
            focus_menu_state: self.focus_menu_state(),
        }
    }

    pub fn mode(&self) -> &NavMode {
        &self.mode
    }

    pub fn grid_position(&self) -> GridPosition {
        self.position
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.rows, self.cols)
    }

    pub fn focused_widget_id(&self) -> Option<&str> {
        match &self.mode {
            NavMode::Widget(focus) => Some(focus.widget_id.as_str()),
            _ => None,
        }
    }

    pub fn menu_open(&self) -> bool {
        self.mode == NavMode::Sidebar
    }

    pub fn selected_menu_item(&self) -> usize {
        self.selected_menu_item
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// The displayed focus menu, if any.
    pub fn focus_menu(&self) -> Option<&ActiveMenu> {
        match &self.mode {
            NavMode::Widget(focus) => focus.menu.as_ref(),
            _ => None,
        }
    }

    pub fn focus_menu_state(&self) -> FocusMenuState {
        match &self.mode {
            NavMode::Widget(WidgetFocus {
                widget_id,
                menu: Some(menu),
            }) => FocusMenuState {
                active: true,
                widget_id: Some(widget_id.clone()),
                menu_config: Some(menu.config.clone()),
                selected_index: menu.selected,
                in_menu: menu.in_menu,
            },
            _ => FocusMenuState::empty(),
        }
    }

    /// Merge a partial update. Out-of-bounds positions are ignored.
    pub fn set_state(&mut self, patch: StatePatch) {
        if let Some(pos) = patch.grid_position {
            self.set_grid_position(pos.row, pos.col);
        }
        if let Some(item) = patch.selected_menu_item {
            self.selected_menu_item = item;
        }
        if let Some(idle) = patch.is_idle {
            self.idle = idle;
        }
        self.persist();
    }

    /// Switch to a page of a different size. The cursor is clamped into
    /// the new bounds.
    pub fn set_bounds(&mut self, rows: u32, cols: u32) {
        self.rows = rows.max(1);
        self.cols = cols.max(1);
        self.position = GridPosition::new(
            self.position.row.clamp(1, self.rows),
            self.position.col.clamp(1, self.cols),
        );
    }

    /// Move the cursor. Out-of-bounds coordinates are a logged no-op.
    pub fn set_grid_position(&mut self, row: u32, col: u32) -> bool {
        if row < 1 || row > self.rows || col < 1 || col > self.cols {
            log::warn!(
                "Ignoring out-of-bounds grid position ({row}, {col}) on {}x{} page",
                self.rows,
                self.cols
            );
            return false;
        }
        self.position = GridPosition::new(row, col);
        true
    }

    /// Open or close the sidebar, optionally selecting an item.
    ///
    /// Opening is refused while a widget owns input.
    pub fn set_menu_state(&mut self, open: bool, item: Option<usize>) -> bool {
        if open {
            if let NavMode::Widget(focus) = &self.mode {
                log::warn!(
                    "Refusing to open sidebar while '{}' is focused",
                    focus.widget_id
                );
                return false;
            }
            self.mode = NavMode::Sidebar;
        } else if self.mode == NavMode::Sidebar {
            self.mode = NavMode::Grid;
        }
        if let Some(item) = item {
            self.selected_menu_item = item;
            self.persist();
        }
        true
    }

    /// Give input to a widget, or return it to the grid with `None`.
    ///
    /// Focusing the already focused widget keeps its menu state. Clearing
    /// focus also clears any focus menu; clearing twice is a no-op.
    pub fn set_focused_widget(&mut self, widget_id: Option<&str>) {
        match widget_id {
            Some(id) => {
                if self.focused_widget_id() == Some(id) {
                    return;
                }
                self.mode = NavMode::Widget(WidgetFocus {
                    widget_id: id.to_string(),
                    menu: None,
                });
            },
            None => {
                if matches!(self.mode, NavMode::Widget(_)) {
                    self.mode = NavMode::Grid;
                }
            },
        }
    }

    /// Show `config` as the focus menu of the focused widget `widget_id`,
    /// with the cursor in the menu at its default item.
    pub fn set_focus_menu_active(&mut self, widget_id: &str, config: MenuConfig) -> bool {
        match &mut self.mode {
            NavMode::Widget(focus) if focus.widget_id == widget_id => {
                let selected = config.default_index.min(config.items.len().saturating_sub(1));
                focus.menu = Some(ActiveMenu {
                    config,
                    selected,
                    in_menu: true,
                });
                true
            },
            _ => {
                log::warn!("Focus menu for '{widget_id}' refused: widget is not focused");
                false
            },
        }
    }

    /// Reset the focus menu to the empty shape.
    pub fn clear_focus_menu_state(&mut self) {
        if let NavMode::Widget(focus) = &mut self.mode {
            focus.menu = None;
        }
    }

    /// Move the focus-menu selection. Out-of-range indices are refused.
    pub fn set_focus_menu_selection(&mut self, index: usize) -> bool {
        match self.active_menu_mut() {
            Some(menu) if index < menu.config.items.len() => {
                menu.selected = index;
                true
            },
            Some(_) => {
                log::warn!("Ignoring out-of-range focus menu index {index}");
                false
            },
            None => false,
        }
    }

    /// Hand the cursor from the focus menu to the widget content (`true`)
    /// or back to the menu (`false`).
    pub fn set_focus_menu_in_widget(&mut self, in_widget: bool) -> bool {
        match self.active_menu_mut() {
            Some(menu) => {
                menu.in_menu = !in_widget;
                true
            },
            None => false,
        }
    }

    /// Swap in a re-registered config for the displayed menu, keeping the
    /// sub-state and clamping the selection.
    pub fn replace_focus_menu_config(&mut self, config: MenuConfig) -> bool {
        match self.active_menu_mut() {
            Some(menu) => {
                menu.selected = menu.selected.min(config.items.len().saturating_sub(1));
                menu.config = config;
                true
            },
            None => false,
        }
    }

    pub fn set_idle(&mut self, idle: bool) {
        self.idle = idle;
    }

    /// The durable store, shared with other persisted keys.
    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn store_mut(&mut self) -> &mut dyn KeyValueStore {
        self.store.as_mut()
    }

    fn active_menu_mut(&mut self) -> Option<&mut ActiveMenu> {
        match &mut self.mode {
            NavMode::Widget(focus) => focus.menu.as_mut(),
            _ => None,
        }
    }

    fn persist(&mut self) {
        if self.persisted_menu_item == Some(self.selected_menu_item) {
            return;
        }
        let blob = PersistedState {
            selected_menu_item: self.selected_menu_item,
        };
        let text = match serde_json::to_string(&blob) {
            Ok(t) => t,
            Err(e) => {
                log::warn!("Failed to encode dashboard state: {e}");
                return;
            },
        };
        match self.store.set(DASHBOARD_STATE_KEY, &text) {
            Ok(()) => self.persisted_menu_item = Some(self.selected_menu_item),
            Err(e) => log::warn!("Failed to persist dashboard state: {e}"),
        }
    }
}

fn load_persisted(store: &dyn KeyValueStore) -> Option<usize> {
    let text = match store.get(DASHBOARD_STATE_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read dashboard state: {e}");
            return None;
        },
    };
    match serde_json::from_str::<PersistedState>(&text) {
        Ok(blob) => Some(blob.selected_menu_item),
        Err(e) => {
            log::warn!("Ignoring corrupt dashboard state: {e}");
            None
        },
    }
}
