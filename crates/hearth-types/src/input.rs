//! Platform-agnostic input event types.
//!
//! Every input source (keyboard, TV remote, touch layer) produces an
//! [`InputEvent`]. Key-like events are normalized into the small [`Action`]
//! vocabulary before anything in the core sees them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HearthError;

/// A raw input event from one of the supported sources.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Keyboard key by DOM key name (`"ArrowUp"`, `"Enter"`, `"m"`, `" "`).
    Key(String),
    /// Remote / TV numeric keycode.
    KeyCode(u32),
    /// Touch swipe gesture.
    Swipe(Direction),
    /// Tap on an addressable element.
    Tap(TapTarget),
}

/// Elements a tap can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapTarget {
    /// A grid cell (1-indexed).
    Cell { row: u32, col: u32 },
    /// A sidebar menu item by index.
    MenuItem(usize),
    /// The dimmed backdrop behind a focused widget or open sidebar.
    Backdrop,
}

/// Cardinal directions for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Row/column delta for one step in this direction.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// The normalized action vocabulary every input source maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Menu,
    Space,
    PrevView,
    NextView,
    SleepToggle,
}

impl Action {
    pub const ALL: [Action; 11] = [
        Action::Up,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Enter,
        Action::Escape,
        Action::Menu,
        Action::Space,
        Action::PrevView,
        Action::NextView,
        Action::SleepToggle,
    ];

    /// Wire name of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::Enter => "enter",
            Self::Escape => "escape",
            Self::Menu => "menu",
            Self::Space => "space",
            Self::PrevView => "prev-view",
            Self::NextView => "next-view",
            Self::SleepToggle => "sleep-toggle",
        }
    }

    /// The direction carried by a directional action.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Up => Some(Direction::Up),
            Self::Down => Some(Direction::Down),
            Self::Left => Some(Direction::Left),
            Self::Right => Some(Direction::Right),
            _ => None,
        }
    }
}

impl From<Direction> for Action {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
            Direction::Left => Self::Left,
            Direction::Right => Self::Right,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| HearthError::Protocol(format!("unknown action: {s}")))
    }
}
