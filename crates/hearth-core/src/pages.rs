//! Page switching and per-page focus snapshots.

use std::collections::HashMap;

use crate::error::{HearthError, Result};
use crate::input::Direction;
use crate::layout::{GridPosition, PageConfig, PageLayout};
use crate::state::FocusMenuState;

/// Focus state saved when leaving a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    pub grid_position: GridPosition,
    pub focused_widget_id: Option<String>,
    pub focus_menu_state: FocusMenuState,
}

/// Ordered set of pages plus the saved state of each page left behind.
#[derive(Debug)]
pub struct PageManager {
    pages: Vec<PageConfig>,
    current: usize,
    saved: HashMap<String, PageState>,
}

impl PageManager {
    pub fn new(layout: PageLayout) -> Result<Self> {
        if layout.pages.is_empty() {
            return Err(HearthError::Layout("layout defines no pages".into()));
        }
        Ok(Self {
            pages: layout.pages,
            current: 0,
            saved: HashMap::new(),
        })
    }

    pub fn current(&self) -> &PageConfig {
        &self.pages[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn pages(&self) -> &[PageConfig] {
        &self.pages
    }

    pub fn index_of(&self, page_id: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.id == page_id)
    }

    /// The page reached by crossing the top (`Up`) or bottom (`Down`)
    /// boundary. Pages do not wrap.
    pub fn adjacent(&self, dir: Direction) -> Option<usize> {
        match dir {
            Direction::Up => self.current.checked_sub(1),
            Direction::Down => Some(self.current + 1).filter(|&i| i < self.pages.len()),
            Direction::Left | Direction::Right => None,
        }
    }

    /// Record the departing page's state, overwriting any earlier snapshot.
    pub fn save_current(&mut self, state: PageState) {
        let id = self.current().id.clone();
        log::debug!("Saved page state for '{id}' at {:?}", state.grid_position);
        self.saved.insert(id, state);
    }

    pub fn saved(&self, page_id: &str) -> Option<&PageState> {
        self.saved.get(page_id)
    }

    /// Make `index` the current page.
    pub fn switch_to(&mut self, index: usize) -> Option<&PageConfig> {
        if index >= self.pages.len() {
            log::warn!("Ignoring switch to missing page index {index}");
            return None;
        }
        self.current = index;
        log::info!("Switched to page '{}'", self.pages[index].id);
        Some(&self.pages[index])
    }
}
