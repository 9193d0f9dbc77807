//! Hearth core engine.
//!
//! Platform-agnostic dashboard engine for a smart home display: page grids,
//! the navigation and focus state machine, widget focus menus, the widget
//! message protocol, the inactivity timer and input normalization. Rendering,
//! widget frames, overlays and display power are injected collaborators.

// Re-exports from hearth-types (foundation types).
pub use hearth_types::config;
pub use hearth_types::error;
pub use hearth_types::input;

pub mod dashboard;
pub mod focus_menu;
pub mod keymap;
pub mod layout;
pub mod messenger;
pub mod navigation;
pub mod pages;
pub mod services;
pub mod sidebar;
pub mod state;
pub mod storage;
pub mod timer;
pub mod view;

#[cfg(test)]
pub(crate) mod test_utils;

pub use dashboard::{Collaborators, Dashboard};
