//! Line protocol read from stdin.
//!
//! ```text
//! key ArrowUp          keyboard key name (`key space` for " ")
//! code 4               remote keycode
//! swipe left           touch swipe
//! tap 2 1              tap a grid cell
//! tap item 3           tap a sidebar entry
//! tap backdrop         tap the backdrop
//! action prev-view     normalized action
//! msg clock {...}      message from a widget frame
//! theme dark           switch theme
//! state weather {...}  update one aggregated-state entry
//! show                 print the current view
//! quit
//! ```

use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;

use hearth_core::input::{Action, Direction, InputEvent, TapTarget};
use hearth_core::messenger::Theme;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Input(InputEvent),
    Action(Action),
    Message { widget: String, payload: Value },
    Theme(Theme),
    State { key: String, value: Value },
    Show,
    Quit,
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let cmd = match verb {
        "key" => {
            let key = match rest {
                "" => bail!("key needs a key name"),
                "space" => " ",
                other => other,
            };
            Command::Input(InputEvent::Key(key.to_string()))
        },
        "code" => {
            let code = rest
                .parse::<u32>()
                .with_context(|| format!("bad keycode {rest:?}"))?;
            Command::Input(InputEvent::KeyCode(code))
        },
        "swipe" => Command::Input(InputEvent::Swipe(direction(rest)?)),
        "tap" => Command::Input(InputEvent::Tap(tap_target(rest)?)),
        "action" => Command::Action(rest.parse()?),
        "msg" => {
            let (widget, json) = rest
                .split_once(' ')
                .ok_or_else(|| anyhow!("usage: msg <widget> <json>"))?;
            let payload = serde_json::from_str(json.trim()).context("bad widget message json")?;
            Command::Message {
                widget: widget.to_string(),
                payload,
            }
        },
        "theme" => match rest {
            "light" => Command::Theme(Theme::Light),
            "dark" => Command::Theme(Theme::Dark),
            other => bail!("unknown theme {other:?}"),
        },
        "state" => {
            let (key, json) = rest
                .split_once(' ')
                .ok_or_else(|| anyhow!("usage: state <key> <json>"))?;
            let value = serde_json::from_str(json.trim()).context("bad state json")?;
            Command::State {
                key: key.to_string(),
                value,
            }
        },
        "show" => Command::Show,
        "quit" | "exit" => Command::Quit,
        other => bail!("unknown command {other:?}"),
    };
    Ok(Some(cmd))
}

fn direction(word: &str) -> Result<Direction> {
    Ok(match word {
        "up" => Direction::Up,
        "down" => Direction::Down,
        "left" => Direction::Left,
        "right" => Direction::Right,
        other => bail!("unknown direction {other:?}"),
    })
}

fn tap_target(rest: &str) -> Result<TapTarget> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    Ok(match parts.as_slice() {
        ["backdrop"] => TapTarget::Backdrop,
        ["item", index] => TapTarget::MenuItem(index.parse().context("bad item index")?),
        [row, col] => TapTarget::Cell {
            row: row.parse().context("bad row")?,
            col: col.parse().context("bad column")?,
        },
        _ => bail!("usage: tap <row> <col> | tap item <n> | tap backdrop"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn cmd(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_and_comment_lines_skipped() {
        assert!(parse("").unwrap().is_none());
        assert!(parse("   ").unwrap().is_none());
        assert!(parse("# focus the clock").unwrap().is_none());
    }

    #[test]
    fn key_like_inputs() {
        assert_eq!(cmd("key ArrowUp"), Command::Input(InputEvent::Key("ArrowUp".into())));
        assert_eq!(cmd("key space"), Command::Input(InputEvent::Key(" ".into())));
        assert_eq!(cmd("code 4"), Command::Input(InputEvent::KeyCode(4)));
        assert_eq!(cmd("swipe left"), Command::Input(InputEvent::Swipe(Direction::Left)));
        assert_eq!(cmd("action prev-view"), Command::Action(Action::PrevView));
    }

    #[test]
    fn taps() {
        assert_eq!(
            cmd("tap 2 1"),
            Command::Input(InputEvent::Tap(TapTarget::Cell { row: 2, col: 1 }))
        );
        assert_eq!(cmd("tap item 3"), Command::Input(InputEvent::Tap(TapTarget::MenuItem(3))));
        assert_eq!(cmd("tap backdrop"), Command::Input(InputEvent::Tap(TapTarget::Backdrop)));
    }

    #[test]
    fn widget_message_and_state() {
        assert_eq!(
            cmd(r#"msg clock {"action": "widget-ready"}"#),
            Command::Message {
                widget: "clock".into(),
                payload: json!({"action": "widget-ready"}),
            }
        );
        assert_eq!(
            cmd(r#"state weather {"temp": 4}"#),
            Command::State {
                key: "weather".into(),
                value: json!({"temp": 4}),
            }
        );
        assert_eq!(cmd("theme dark"), Command::Theme(Theme::Dark));
        assert_eq!(cmd("quit"), Command::Quit);
        assert_eq!(cmd("show"), Command::Show);
    }

    #[test]
    fn errors_are_reported() {
        for bad in [
            "key",
            "code x",
            "swipe sideways",
            "tap 1",
            "action jump",
            "msg clock",
            "msg clock {",
            "theme blue",
            "launch rockets",
        ] {
            assert!(parse(bad).is_err(), "{bad:?} should fail");
        }
    }
}
