//! Error types for hearth.

use std::io;

/// Errors produced by the hearth framework.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    #[error("config error: {0}")]
    Config(String),

    #[error("layout error: {0}")]
    Layout(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, HearthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let e = HearthError::Config("missing key".into());
        assert_eq!(format!("{e}"), "config error: missing key");
    }

    #[test]
    fn layout_error_display() {
        let e = HearthError::Layout("overlapping widgets".into());
        assert_eq!(format!("{e}"), "layout error: overlapping widgets");
    }

    #[test]
    fn protocol_error_display() {
        let e = HearthError::Protocol("unknown action".into());
        assert_eq!(format!("{e}"), "protocol error: unknown action");
    }

    #[test]
    fn transport_error_display() {
        let e = HearthError::Transport("no frame".into());
        assert_eq!(format!("{e}"), "transport error: no frame");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: HearthError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("this is [[[not valid toml").unwrap_err();
        let e: HearthError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: HearthError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }
}
