//! Page layouts: grid dimensions and the widgets placed on them.
//!
//! Layouts are loaded from TOML and validated once; after that every
//! descriptor is immutable for the life of the page.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};

/// A 1-indexed grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPosition {
    pub row: u32,
    pub col: u32,
}

impl GridPosition {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl Default for GridPosition {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Static placement of one widget on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDescriptor {
    pub id: String,
    /// Anchor (top-left) row.
    pub row: u32,
    /// Anchor (top-left) column.
    pub col: u32,
    #[serde(default = "one")]
    pub row_span: u32,
    #[serde(default = "one")]
    pub col_span: u32,
    #[serde(default)]
    pub label: String,
    /// Content path loaded into the widget frame.
    #[serde(default)]
    pub path: String,
    /// Excludes the widget from the centering/zoom focus treatment.
    #[serde(default)]
    pub no_center: bool,
    /// Visual zoom applied on focus.
    #[serde(default = "default_focus_scale")]
    pub focus_scale: f32,
    /// Non-selectable cells are skipped by navigation.
    #[serde(default = "yes")]
    pub selectable: bool,
}

fn one() -> u32 {
    1
}
fn yes() -> bool {
    true
}
fn default_focus_scale() -> f32 {
    1.05
}

impl WidgetDescriptor {
    pub fn anchor(&self) -> GridPosition {
        GridPosition::new(self.row, self.col)
    }

    /// Whether the widget's span covers `pos`.
    pub fn covers(&self, pos: GridPosition) -> bool {
        pos.row >= self.row
            && pos.row < self.row + self.row_span
            && pos.col >= self.col
            && pos.col < self.col + self.col_span
    }

    /// Every cell the widget occupies.
    pub fn cells(&self) -> impl Iterator<Item = GridPosition> + '_ {
        (self.row..self.row + self.row_span).flat_map(move |r| {
            (self.col..self.col + self.col_span).map(move |c| GridPosition::new(r, c))
        })
    }
}

/// One independently configured grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub grid_rows: u32,
    pub grid_cols: u32,
    /// Sidebar item id highlighted when the sidebar opens on this page.
    #[serde(default)]
    pub main_item: Option<String>,
    #[serde(default)]
    pub widgets: Vec<WidgetDescriptor>,
}

impl PageConfig {
    pub fn in_bounds(&self, pos: GridPosition) -> bool {
        pos.row >= 1 && pos.row <= self.grid_rows && pos.col >= 1 && pos.col <= self.grid_cols
    }

    /// The widget whose span covers `pos`.
    pub fn widget_at(&self, pos: GridPosition) -> Option<&WidgetDescriptor> {
        self.widgets.iter().find(|w| w.covers(pos))
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetDescriptor> {
        self.widgets.iter().find(|w| w.id == id)
    }

    fn validate(&self) -> Result<()> {
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return Err(HearthError::Layout(format!(
                "page '{}' has an empty grid",
                self.id
            )));
        }
        let mut ids = HashSet::new();
        let mut occupied = HashSet::new();
        for w in &self.widgets {
            if !ids.insert(w.id.as_str()) {
                return Err(HearthError::Layout(format!(
                    "page '{}' repeats widget id '{}'",
                    self.id, w.id
                )));
            }
            if w.row_span == 0 || w.col_span == 0 {
                return Err(HearthError::Layout(format!("widget '{}' has a zero span", w.id)));
            }
            let far = GridPosition::new(w.row + w.row_span - 1, w.col + w.col_span - 1);
            if !self.in_bounds(w.anchor()) || !self.in_bounds(far) {
                return Err(HearthError::Layout(format!(
                    "widget '{}' extends outside the {}x{} grid",
                    w.id, self.grid_rows, self.grid_cols
                )));
            }
            if w.focus_scale.is_nan() || w.focus_scale <= 1.0 {
                return Err(HearthError::Layout(format!(
                    "widget '{}' focus_scale must be greater than 1",
                    w.id
                )));
            }
            for cell in w.cells() {
                if !occupied.insert(cell) {
                    return Err(HearthError::Layout(format!(
                        "widget '{}' overlaps another widget at ({}, {})",
                        w.id, cell.row, cell.col
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The full ordered set of pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub pages: Vec<PageConfig>,
}

const BUILTIN_LAYOUT: &str = r#"
[[pages]]
id = "home"
label = "Home"
grid_rows = 3
grid_cols = 2
main_item = "home"

[[pages.widgets]]
id = "clock"
row = 1
col = 1
label = "Clock"
path = "widgets/clock.html"

[[pages.widgets]]
id = "photos"
row = 1
col = 2
row_span = 2
label = "Photos"
path = "widgets/photos.html"
no_center = true
focus_scale = 1.02

[[pages.widgets]]
id = "agenda"
row = 2
col = 1
label = "Agenda"
path = "widgets/agenda.html"

[[pages.widgets]]
id = "calendar"
row = 3
col = 1
col_span = 2
label = "Calendar"
path = "widgets/calendar.html"

[[pages]]
id = "camera"
label = "Camera"
grid_rows = 2
grid_cols = 2
main_item = "camera"

[[pages.widgets]]
id = "camera-feed"
row = 1
col = 1
row_span = 2
col_span = 2
label = "Camera"
path = "widgets/camera.html"
no_center = true
focus_scale = 1.01
"#;

impl PageLayout {
    /// Parse and validate a layout from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let layout: Self = toml::from_str(text)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a layout file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let layout = Self::from_toml(&text)?;
        log::info!(
            "Loaded {} page(s) from {}",
            layout.pages.len(),
            path.display()
        );
        Ok(layout)
    }

    /// The layout shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_LAYOUT)
    }

    fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            return Err(HearthError::Layout("layout defines no pages".into()));
        }
        let mut ids = HashSet::new();
        for page in &self.pages {
            if !ids.insert(page.id.as_str()) {
                return Err(HearthError::Layout(format!("duplicate page id '{}'", page.id)));
            }
            page.validate()?;
        }
        Ok(())
    }
}
