//! Cursor stepping on a page grid.

use crate::input::Direction;
use crate::layout::{GridPosition, PageConfig};

/// Outcome of one directional step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The cursor lands here (already snapped to a widget anchor).
    Moved(GridPosition),
    /// No stop exists before the page edge.
    Boundary,
}

/// Step from `from` towards `dir`.
///
/// Cells covered by the origin's own widget are passed over, so a tall or
/// wide widget is a single stop. Cells of non-selectable widgets are passed
/// over too. A landing inside a spanning widget snaps to its anchor.
pub fn step(page: &PageConfig, from: GridPosition, dir: Direction) -> Step {
    let origin = page.widget_at(from).map(|w| w.id.as_str());
    let (dr, dc) = dir.delta();
    let mut row = i64::from(from.row);
    let mut col = i64::from(from.col);
    loop {
        row += dr;
        col += dc;
        if row < 1 || col < 1 || row > i64::from(page.grid_rows) || col > i64::from(page.grid_cols) {
            return Step::Boundary;
        }
        let pos = GridPosition::new(row as u32, col as u32);
        match page.widget_at(pos) {
            Some(w) if Some(w.id.as_str()) == origin || !w.selectable => continue,
            Some(w) => return Step::Moved(w.anchor()),
            None => return Step::Moved(pos),
        }
    }
}

/// Snap a cell to the anchor of the widget covering it.
pub fn snap(page: &PageConfig, pos: GridPosition) -> GridPosition {
    page.widget_at(pos).map_or(pos, |w| w.anchor())
}

/// Where the cursor lands after crossing onto an adjacent page in `dir`:
/// the opposite edge row, same column clamped to the new width.
pub fn entry_point(page: &PageConfig, col: u32, dir: Direction) -> GridPosition {
    let row = match dir {
        Direction::Up => page.grid_rows,
        _ => 1,
    };
    snap(page, GridPosition::new(row, col.clamp(1, page.grid_cols)))
}
