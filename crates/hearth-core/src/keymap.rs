//! Lookup tables from raw input to the action vocabulary.

use crate::input::{Action, Direction, InputEvent};

/// Keyboard key names.
const KEY_MAP: &[(&str, Action)] = &[
    ("ArrowUp", Action::Up),
    ("ArrowDown", Action::Down),
    ("ArrowLeft", Action::Left),
    ("ArrowRight", Action::Right),
    ("Enter", Action::Enter),
    ("Escape", Action::Escape),
    ("Backspace", Action::Escape),
    ("m", Action::Menu),
    ("M", Action::Menu),
    (" ", Action::Space),
    (",", Action::PrevView),
    (".", Action::NextView),
];

/// Numeric keycodes. Covers Android TV / remote codes and the legacy
/// browser `keyCode` values; the two ranges do not collide.
const KEYCODE_MAP: &[(u32, Action)] = &[
    // Android
    (19, Action::Up),
    (20, Action::Down),
    (21, Action::Left),
    (22, Action::Right),
    (23, Action::Enter),
    (66, Action::Enter),
    (4, Action::Escape),
    (111, Action::Escape),
    (82, Action::Menu),
    (62, Action::Space),
    (89, Action::PrevView),
    (90, Action::NextView),
    (26, Action::SleepToggle),
    (223, Action::SleepToggle),
    // Browser
    (38, Action::Up),
    (40, Action::Down),
    (37, Action::Left),
    (39, Action::Right),
    (13, Action::Enter),
    (27, Action::Escape),
    (8, Action::Escape),
    (32, Action::Space),
    (77, Action::Menu),
    (188, Action::PrevView),
    (190, Action::NextView),
];

pub fn action_for_key(key: &str) -> Option<Action> {
    KEY_MAP.iter().find(|(k, _)| *k == key).map(|&(_, a)| a)
}

pub fn action_for_keycode(code: u32) -> Option<Action> {
    KEYCODE_MAP.iter().find(|(c, _)| *c == code).map(|&(_, a)| a)
}

/// A swipe moves the cursor in the swiped direction.
pub fn action_for_swipe(dir: Direction) -> Action {
    Action::from(dir)
}

/// Normalize a key-like event. Taps address elements directly and have no
/// action equivalent.
pub fn normalize(event: &InputEvent) -> Option<Action> {
    let action = match event {
        InputEvent::Key(key) => action_for_key(key),
        InputEvent::KeyCode(code) => action_for_keycode(*code),
        InputEvent::Swipe(dir) => Some(action_for_swipe(*dir)),
        InputEvent::Tap(_) => None,
    };
    if action.is_none() && !matches!(event, InputEvent::Tap(_)) {
        log::debug!("Unmapped input {event:?}");
    }
    action
}
