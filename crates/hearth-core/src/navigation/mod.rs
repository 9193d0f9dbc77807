//! The navigation state machine.
//!
//! One entry point per logical input. Every handler reads the current
//! [`NavMode`], decides, writes state and returns whether the input was
//! handled. Handlers never fail: a missing widget or a rejected move is
//! logged and reported as unhandled (or handled, for grid edges).
//!
//! Operations the navigation layer cannot perform itself (reload, sleep,
//! settings, exit confirmation) are queued as [`ShellRequest`]s for the
//! owning dashboard to carry out.

pub mod grid;

#[cfg(test)]
mod tests;

use serde_json::Value;

use crate::error::Result;
use crate::focus_menu::{FocusMenuRegistry, MenuConfig};
use crate::input::{Action, Direction};
use crate::layout::{GridPosition, PageLayout};
use crate::messenger::{HostMessage, Outbound, WidgetMessenger};
use crate::pages::{PageManager, PageState};
use crate::sidebar::{Sidebar, SidebarAction};
use crate::state::{DashboardState, NavMode, StateManager};
use crate::storage::KeyValueStore;
use crate::view::{DashboardView, FocusMenuView, FocusedView, SidebarEntryView, SidebarView, Surface};

use self::grid::Step;

/// Work the dashboard performs on behalf of a sidebar item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellRequest {
    Reload,
    Sleep,
    OpenSettings(Option<String>),
    ConfirmExit,
}

pub struct NavigationManager {
    state: StateManager,
    pages: PageManager,
    menus: FocusMenuRegistry,
    messenger: WidgetMessenger,
    sidebar: Sidebar,
    surface: Box<dyn Surface>,
    /// Bumped by every user input and focus transition.
    generation: u64,
    requests: Vec<ShellRequest>,
}

impl std::fmt::Debug for NavigationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationManager")
            .field("state", &self.state)
            .field("page", &self.pages.current().id)
            .field("generation", &self.generation)
            .finish()
    }
}

impl NavigationManager {
    /// Build the state machine over `layout`. Every widget frame on every
    /// page is attached to the messenger.
    pub fn new(
        layout: PageLayout,
        store: Box<dyn KeyValueStore>,
        mut messenger: WidgetMessenger,
        surface: Box<dyn Surface>,
    ) -> Result<Self> {
        let pages = PageManager::new(layout)?;
        for page in pages.pages() {
            for w in &page.widgets {
                messenger.attach(&w.id);
            }
        }
        let first = pages.current();
        let mut state = StateManager::new(store, first.grid_rows, first.grid_cols);
        let start = grid::snap(first, GridPosition::default());
        state.set_grid_position(start.row, start.col);
        let sidebar = Sidebar::new(Sidebar::default_items(pages.pages()));
        Ok(Self {
            state,
            pages,
            menus: FocusMenuRegistry::new(),
            messenger,
            sidebar,
            surface,
            generation: 0,
            requests: Vec::new(),
        })
    }

    // -- accessors ---------------------------------------------------------

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut StateManager {
        &mut self.state
    }

    pub fn snapshot(&self) -> DashboardState {
        self.state.get_state()
    }

    pub fn pages(&self) -> &PageManager {
        &self.pages
    }

    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }

    pub fn sidebar_mut(&mut self) -> &mut Sidebar {
        &mut self.sidebar
    }

    pub fn messenger(&self) -> &WidgetMessenger {
        &self.messenger
    }

    pub fn messenger_mut(&mut self) -> &mut WidgetMessenger {
        &mut self.messenger
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Record a user input. Supersedes any deferred timeout effect.
    pub fn note_input(&mut self) {
        self.bump();
    }

    /// Drain the queued shell work.
    pub fn take_requests(&mut self) -> Vec<ShellRequest> {
        std::mem::take(&mut self.requests)
    }

    // -- routing -----------------------------------------------------------

    /// Actions while a widget owns input.
    pub fn handle_widget_action(&mut self, action: Action) -> bool {
        match action {
            Action::Up | Action::Down | Action::Left | Action::Right => match action.direction() {
                Some(dir) => self.move_in(dir),
                None => false,
            },
            Action::Enter | Action::Space => self.handle_enter(),
            Action::Escape => self.handle_escape(),
            Action::PrevView | Action::NextView => self.forward(action.as_str()),
            Action::Menu | Action::SleepToggle => false,
        }
    }

    /// Actions while the grid cursor or the sidebar owns input.
    pub fn handle_grid_action(&mut self, action: Action) -> bool {
        match action {
            Action::Up | Action::Down | Action::Left | Action::Right => match action.direction() {
                Some(dir) => self.move_in(dir),
                None => false,
            },
            Action::Enter | Action::Space => self.handle_enter(),
            Action::Escape => self.handle_escape(),
            Action::Menu => self.toggle_menu(),
            Action::PrevView | Action::NextView | Action::SleepToggle => false,
        }
    }

    pub fn move_up(&mut self) -> bool {
        self.move_in(Direction::Up)
    }

    pub fn move_down(&mut self) -> bool {
        self.move_in(Direction::Down)
    }

    pub fn move_left(&mut self) -> bool {
        self.move_in(Direction::Left)
    }

    pub fn move_right(&mut self) -> bool {
        self.move_in(Direction::Right)
    }

    fn move_in(&mut self, dir: Direction) -> bool {
        match self.state.mode() {
            NavMode::Grid => self.grid_move(dir),
            NavMode::Sidebar => self.sidebar_move(dir),
            NavMode::Widget(_) => self.widget_move(dir),
        }
    }

    pub fn handle_enter(&mut self) -> bool {
        match self.state.mode() {
            NavMode::Grid => {
                let pos = self.state.grid_position();
                let target = self
                    .pages
                    .current()
                    .widget_at(pos)
                    .filter(|w| w.selectable)
                    .map(|w| w.id.clone());
                match target {
                    Some(id) => self.focus_widget(&id),
                    None => {
                        log::debug!("Enter on empty cell ({}, {})", pos.row, pos.col);
                        false
                    },
                }
            },
            NavMode::Sidebar => self.select_menu_item(self.state.selected_menu_item()),
            NavMode::Widget(focus) => match &focus.menu {
                Some(menu) if menu.in_menu => {
                    let Some(item_id) = menu.selected_id().map(str::to_string) else {
                        return false;
                    };
                    let widget_id = focus.widget_id.clone();
                    self.messenger
                        .send(&widget_id, HostMessage::MenuItemSelected { item_id });
                    true
                },
                _ => self.forward(HostMessage::Enter),
            },
        }
    }

    pub fn handle_escape(&mut self) -> bool {
        match self.state.mode() {
            NavMode::Grid => {
                log::debug!("Escape on grid, going idle");
                self.state.set_idle(true);
                self.render();
                true
            },
            NavMode::Sidebar => self.close_menu(),
            NavMode::Widget(focus) => match &focus.menu {
                Some(menu) if !menu.in_menu => self.back_to_menu(),
                _ => self.defocus_widget(),
            },
        }
    }

    // -- grid --------------------------------------------------------------

    fn grid_move(&mut self, dir: Direction) -> bool {
        let from = self.state.grid_position();
        match grid::step(self.pages.current(), from, dir) {
            Step::Moved(pos) => {
                self.state.set_grid_position(pos.row, pos.col);
            },
            Step::Boundary => match dir {
                Direction::Left => return self.open_menu(),
                Direction::Right => log::debug!("Right edge at ({}, {})", from.row, from.col),
                Direction::Up | Direction::Down => match self.pages.adjacent(dir) {
                    Some(index) => {
                        self.cross_to_page(index, from.col, dir);
                    },
                    None => log::debug!("No page beyond the {dir:?} edge"),
                },
            },
        }
        self.render();
        true
    }

    fn cross_to_page(&mut self, index: usize, col: u32, dir: Direction) {
        self.save_page_state();
        let Some(page) = self.pages.switch_to(index) else {
            return;
        };
        let (rows, cols) = (page.grid_rows, page.grid_cols);
        let land = grid::entry_point(page, col, dir);
        self.state.set_bounds(rows, cols);
        self.state.set_grid_position(land.row, land.col);
        self.bump();
    }

    fn save_page_state(&mut self) {
        let snapshot = PageState {
            grid_position: self.state.grid_position(),
            focused_widget_id: self.state.focused_widget_id().map(str::to_string),
            focus_menu_state: self.state.focus_menu_state(),
        };
        self.pages.save_current(snapshot);
    }

    /// Show page `index`, restoring where the cursor was when it was last
    /// left. A focused widget is defocused first and refocused on return.
    pub fn switch_page(&mut self, index: usize) -> bool {
        if index >= self.pages.pages().len() {
            log::warn!("Ignoring switch to missing page index {index}");
            return false;
        }
        if index == self.pages.current_index() {
            return true;
        }
        self.save_page_state();
        self.defocus_widget();
        if self.pages.switch_to(index).is_none() {
            return false;
        }
        let page = self.pages.current();
        let saved = self.pages.saved(&page.id).cloned();
        let pos = saved
            .as_ref()
            .map_or_else(|| grid::snap(page, GridPosition::default()), |s| s.grid_position);
        self.state.set_bounds(page.grid_rows, page.grid_cols);
        self.state.set_grid_position(pos.row, pos.col);
        self.bump();
        if let Some(saved) = saved
            && let Some(id) = saved.focused_widget_id
            && self.pages.current().widget(&id).is_some()
            && self.focus_widget(&id)
        {
            let menu = saved.focus_menu_state;
            if menu.active && menu.widget_id.as_deref() == Some(id.as_str()) {
                self.state.set_focus_menu_selection(menu.selected_index);
            }
        }
        self.render();
        true
    }

    // -- sidebar -----------------------------------------------------------

    /// Open the sidebar with the current page's main item selected.
    pub fn open_menu(&mut self) -> bool {
        if self.state.focused_widget_id().is_some() {
            log::debug!("Sidebar not available while a widget is focused");
            return false;
        }
        let index = self
            .pages
            .current()
            .main_item
            .as_deref()
            .and_then(|id| self.sidebar.index_of(id))
            .unwrap_or(0);
        if !self.state.set_menu_state(true, Some(index)) {
            return false;
        }
        log::debug!("Sidebar opened at item {index}");
        self.bump();
        self.render();
        true
    }

    pub fn close_menu(&mut self) -> bool {
        if !self.state.menu_open() {
            return false;
        }
        self.state.set_menu_state(false, None);
        self.bump();
        self.render();
        true
    }

    /// Menu key: open from the grid, close from the sidebar.
    pub fn toggle_menu(&mut self) -> bool {
        match self.state.mode() {
            NavMode::Grid => self.open_menu(),
            NavMode::Sidebar => self.close_menu(),
            NavMode::Widget(_) => false,
        }
    }

    fn sidebar_move(&mut self, dir: Direction) -> bool {
        match dir {
            Direction::Up | Direction::Down => {
                let from = self.state.selected_menu_item();
                if let Some(next) = self.sidebar.step(from, dir == Direction::Down) {
                    self.state.set_menu_state(true, Some(next));
                    self.render();
                }
                true
            },
            Direction::Right => self.close_menu(),
            Direction::Left => true,
        }
    }

    /// Execute sidebar item `index` and close the sidebar.
    pub fn select_menu_item(&mut self, index: usize) -> bool {
        let Some(item) = self.sidebar.item(index) else {
            log::warn!("Ignoring out-of-range sidebar index {index}");
            return false;
        };
        if !item.enabled {
            log::warn!("Ignoring disabled sidebar item '{}'", item.id);
            return false;
        }
        let action = item.action.clone();
        log::info!("Sidebar item '{}' selected", item.id);
        self.state.set_menu_state(false, Some(index));
        self.bump();
        match action {
            SidebarAction::ShowPage(page_id) => match self.pages.index_of(&page_id) {
                Some(i) => {
                    self.switch_page(i);
                },
                None => log::warn!("Sidebar item points at unknown page '{page_id}'"),
            },
            SidebarAction::Reload => self.requests.push(ShellRequest::Reload),
            SidebarAction::Sleep => self.requests.push(ShellRequest::Sleep),
            SidebarAction::Settings => self.requests.push(ShellRequest::OpenSettings(None)),
            SidebarAction::Exit => self.requests.push(ShellRequest::ConfirmExit),
        }
        self.render();
        true
    }

    // -- widget focus ------------------------------------------------------

    /// Give input to a widget on the current page.
    ///
    /// A widget with an enabled focus menu starts in the menu; otherwise the
    /// widget is activated directly.
    pub fn focus_widget(&mut self, widget_id: &str) -> bool {
        let Some(anchor) = self
            .pages
            .current()
            .widget(widget_id)
            .filter(|w| w.selectable)
            .map(|w| w.anchor())
        else {
            log::warn!("Cannot focus '{widget_id}': not a selectable widget on this page");
            return false;
        };
        match self.state.focused_widget_id() {
            Some(current) if current == widget_id => return true,
            Some(_) => {
                self.defocus_widget();
            },
            None => {},
        }
        self.state.set_grid_position(anchor.row, anchor.col);
        self.state.set_focused_widget(Some(widget_id));
        self.state.set_idle(false);
        self.messenger.send(widget_id, HostMessage::EnterFocus);
        match self.menus.menu_for(widget_id).cloned() {
            Some(config) => {
                if self.state.set_focus_menu_active(widget_id, config)
                    && let Some(menu) = self.state.focus_menu()
                {
                    let msg = HostMessage::MenuActive {
                        selected_item: menu.selected,
                        item_id: menu.selected_id().unwrap_or_default().to_string(),
                    };
                    self.messenger.send(widget_id, msg);
                }
            },
            None => {
                self.messenger.send(widget_id, HostMessage::EnterActive);
            },
        }
        log::debug!("Focused '{widget_id}'");
        self.bump();
        self.render();
        true
    }

    /// Return input to the grid. A no-op when nothing is focused.
    pub fn defocus_widget(&mut self) -> bool {
        let Some(widget_id) = self.state.focused_widget_id().map(str::to_string) else {
            return false;
        };
        self.messenger.send(&widget_id, HostMessage::ExitActive);
        self.messenger.send(&widget_id, HostMessage::ExitFocus);
        self.state.set_focused_widget(None);
        self.state.set_idle(false);
        log::debug!("Defocused '{widget_id}'");
        self.bump();
        self.render();
        true
    }

    fn widget_move(&mut self, dir: Direction) -> bool {
        let Some(menu) = self.state.focus_menu() else {
            return self.forward(HostMessage::direction(dir));
        };
        if !menu.in_menu {
            return match dir {
                Direction::Left => self.back_to_menu(),
                _ => self.forward(HostMessage::direction(dir)),
            };
        }
        match dir {
            Direction::Up | Direction::Down => {
                let last = menu.config.items.len().saturating_sub(1);
                let next = match dir {
                    Direction::Up => menu.selected.saturating_sub(1),
                    _ => (menu.selected + 1).min(last),
                };
                if next != menu.selected && self.state.set_focus_menu_selection(next) {
                    self.send_menu_selection();
                    self.render();
                }
                true
            },
            Direction::Right => {
                self.state.set_focus_menu_in_widget(true);
                if let Some(id) = self.state.focused_widget_id().map(str::to_string) {
                    self.messenger.send(&id, HostMessage::EnterActive);
                }
                self.bump();
                self.render();
                true
            },
            Direction::Left => true,
        }
    }

    fn send_menu_selection(&mut self) {
        let Some(id) = self.state.focused_widget_id().map(str::to_string) else {
            return;
        };
        if let Some(menu) = self.state.focus_menu() {
            let msg = HostMessage::MenuSelectionChanged {
                selected_item: menu.selected,
                item_id: menu.selected_id().unwrap_or_default().to_string(),
            };
            self.messenger.send(&id, msg);
        }
    }

    /// In-widget to in-menu.
    fn back_to_menu(&mut self) -> bool {
        let Some(id) = self.state.focused_widget_id().map(str::to_string) else {
            return false;
        };
        match self.state.focus_menu() {
            Some(menu) if !menu.in_menu => {},
            _ => return false,
        }
        self.state.set_focus_menu_in_widget(false);
        self.messenger.send(&id, HostMessage::ExitActive);
        if let Some(menu) = self.state.focus_menu() {
            let msg = HostMessage::MenuActive {
                selected_item: menu.selected,
                item_id: menu.selected_id().unwrap_or_default().to_string(),
            };
            self.messenger.send(&id, msg);
        }
        self.bump();
        self.render();
        true
    }

    /// A widget yielding control back to its focus menu.
    pub fn return_to_menu(&mut self, source_id: &str) -> bool {
        if self.state.focused_widget_id() != Some(source_id) {
            log::debug!("Ignoring return-to-menu from unfocused '{source_id}'");
            return false;
        }
        self.back_to_menu()
    }

    /// Send a command verbatim to the focused widget.
    fn forward(&mut self, message: impl Into<Outbound>) -> bool {
        match self.state.focused_widget_id().map(str::to_string) {
            Some(id) => {
                self.messenger.send(&id, message);
                true
            },
            None => false,
        }
    }

    // -- focus menus -------------------------------------------------------

    /// Register a widget's focus menu. When that widget's menu is on
    /// screen, the display is refreshed in place.
    pub fn register_widget_menu(&mut self, widget_id: &str, config: MenuConfig) -> bool {
        if !self.menus.register(widget_id, config) {
            return false;
        }
        self.refresh_focus_menu(widget_id);
        true
    }

    /// [`register_widget_menu`](Self::register_widget_menu) from a raw
    /// `focusMenu` payload.
    pub fn register_widget_menu_value(&mut self, widget_id: &str, raw: &Value) -> bool {
        if !self.menus.register_value(widget_id, raw) {
            return false;
        }
        self.refresh_focus_menu(widget_id);
        true
    }

    pub fn menus(&self) -> &FocusMenuRegistry {
        &self.menus
    }

    fn refresh_focus_menu(&mut self, widget_id: &str) {
        if self.state.focused_widget_id() != Some(widget_id) {
            return;
        }
        match self.menus.menu_for(widget_id).cloned() {
            Some(config) => {
                if self.state.focus_menu().is_some() {
                    self.state.replace_focus_menu_config(config);
                } else if self.state.set_focus_menu_active(widget_id, config) {
                    // Already active in the widget; show the menu dimmed.
                    self.state.set_focus_menu_in_widget(true);
                }
            },
            None => {
                let was_in_menu = self.state.focus_menu().is_some_and(|m| m.in_menu);
                self.state.clear_focus_menu_state();
                if was_in_menu {
                    self.messenger.send(widget_id, HostMessage::EnterActive);
                }
            },
        }
        log::debug!("Refreshed focus menu of '{widget_id}'");
        self.render();
    }

    // -- touch -------------------------------------------------------------

    /// Tap on a grid cell: move there and focus a selectable widget.
    pub fn tap_cell(&mut self, row: u32, col: u32) -> bool {
        let pos = GridPosition::new(row, col);
        let page = self.pages.current();
        if !page.in_bounds(pos) {
            log::warn!("Ignoring tap outside the grid at ({row}, {col})");
            return false;
        }
        let target = page
            .widget_at(pos)
            .filter(|w| w.selectable)
            .map(|w| w.id.clone());
        if self.state.menu_open() {
            self.state.set_menu_state(false, None);
        }
        match target {
            Some(id) => self.focus_widget(&id),
            None => {
                self.defocus_widget();
                let snapped = grid::snap(self.pages.current(), pos);
                self.state.set_grid_position(snapped.row, snapped.col);
                self.bump();
                self.render();
                true
            },
        }
    }

    /// Tap on a sidebar entry.
    pub fn tap_menu_item(&mut self, index: usize) -> bool {
        if !self.state.menu_open() {
            log::debug!("Ignoring sidebar tap while the sidebar is closed");
            return false;
        }
        self.select_menu_item(index)
    }

    /// Tap on the backdrop behind a focused widget or the open sidebar.
    pub fn tap_backdrop(&mut self) -> bool {
        match self.state.mode() {
            NavMode::Widget(_) => self.defocus_widget(),
            NavMode::Sidebar => self.close_menu(),
            NavMode::Grid => false,
        }
    }

    // -- inactivity --------------------------------------------------------

    /// First half of the timeout sequence. With a widget focused, tell it to
    /// clean up and return the generation the deferred defocus must match.
    pub fn begin_timeout(&mut self) -> Option<u64> {
        let id = self.state.focused_widget_id()?.to_string();
        log::debug!("Timeout while '{id}' is focused");
        self.messenger.send(&id, HostMessage::Escape);
        Some(self.generation)
    }

    /// Second half: defocus and go idle, unless input arrived meanwhile.
    pub fn finish_timeout(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            log::debug!("Deferred defocus superseded by newer input");
            return false;
        }
        self.defocus_widget();
        self.go_idle();
        true
    }

    /// Hide the highlight and close the sidebar. Position is kept.
    pub fn go_idle(&mut self) {
        if self.state.menu_open() {
            self.state.set_menu_state(false, None);
        }
        self.state.set_idle(true);
        log::debug!("Idle");
        self.render();
    }

    // -- rendering ---------------------------------------------------------

    pub fn view(&self) -> DashboardView {
        let page = self.pages.current();
        let idle = self.state.is_idle();
        let highlighted = match self.state.mode() {
            NavMode::Grid if !idle => Some(self.state.grid_position()),
            _ => None,
        };
        let focused_widget = match self.state.mode() {
            NavMode::Widget(focus) => Some(FocusedView {
                widget_id: focus.widget_id.clone(),
                scale: page
                    .widget(&focus.widget_id)
                    .filter(|w| !w.no_center)
                    .map(|w| w.focus_scale),
                menu: focus.menu.as_ref().map(|m| FocusMenuView {
                    items: m.config.items.clone(),
                    selected: m.selected,
                    current_view: m.config.current_view.clone(),
                    dimmed: !m.in_menu,
                }),
            }),
            _ => None,
        };
        let sidebar = self.state.menu_open().then(|| SidebarView {
            items: self
                .sidebar
                .items()
                .iter()
                .map(|i| SidebarEntryView {
                    id: i.id.clone(),
                    label: i.label.clone(),
                    enabled: i.enabled,
                })
                .collect(),
            selected: self.state.selected_menu_item(),
        });
        DashboardView {
            page_id: page.id.clone(),
            page_index: self.pages.current_index(),
            page_count: self.pages.pages().len(),
            highlighted,
            focused_widget,
            sidebar,
            idle,
        }
    }

    pub fn render(&mut self) {
        let view = self.view();
        self.surface.render(&view);
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}
