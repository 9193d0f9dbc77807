//! Runtime configuration loaded from `hearth.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{HearthError, Result};

/// Top-level configuration. Every section and field has a default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HearthConfig {
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub messaging: MessagingConfig,
}

/// Inactivity timeouts.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    /// Idle timeout while the grid cursor or sidebar owns input.
    #[serde(default = "default_selection_secs")]
    pub selection_secs: u64,
    /// Idle timeout while a widget is focused.
    #[serde(default = "default_focus_secs")]
    pub focus_secs: u64,
    /// Delay between telling a widget to clean up and clearing host focus.
    #[serde(default = "default_grace_ms")]
    pub grace_ms: u64,
}

fn default_selection_secs() -> u64 {
    20
}
fn default_focus_secs() -> u64 {
    60
}
fn default_grace_ms() -> u64 {
    10
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            selection_secs: default_selection_secs(),
            focus_secs: default_focus_secs(),
            grace_ms: default_grace_ms(),
        }
    }
}

impl TimeoutConfig {
    pub fn selection(&self) -> Duration {
        Duration::from_secs(self.selection_secs)
    }

    pub fn focus(&self) -> Duration {
        Duration::from_secs(self.focus_secs)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

/// Durable key-value storage location.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for persisted keys. `None` keeps everything in memory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Page layout source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayoutConfig {
    /// Path to a page layout TOML. `None` uses the built-in layout.
    #[serde(default)]
    pub pages: Option<PathBuf>,
}

/// Host-to-widget messaging options.
#[derive(Debug, Clone, Deserialize)]
pub struct MessagingConfig {
    /// Target origin stamped on outbound envelopes.
    #[serde(default = "default_target_origin")]
    pub target_origin: String,
}

fn default_target_origin() -> String {
    "*".to_string()
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            target_origin: default_target_origin(),
        }
    }
}

impl HearthConfig {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a config file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        log::info!("Loaded config from {}", path.display());
        Self::from_toml(&text)
    }

    fn validate(&self) -> Result<()> {
        let t = &self.timeouts;
        if t.selection_secs == 0 || t.focus_secs == 0 {
            return Err(HearthError::Config(
                "timeouts must be at least one second".into(),
            ));
        }
        if self.messaging.target_origin.is_empty() {
            return Err(HearthError::Config("target_origin must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_timeouts() {
        let cfg = HearthConfig::default();
        assert_eq!(cfg.timeouts.selection(), Duration::from_secs(20));
        assert_eq!(cfg.timeouts.focus(), Duration::from_secs(60));
        assert_eq!(cfg.timeouts.grace(), Duration::from_millis(10));
        assert!(cfg.storage.dir.is_none());
        assert!(cfg.layout.pages.is_none());
        assert_eq!(cfg.messaging.target_origin, "*");
    }

    #[test]
    fn empty_toml_is_default() {
        let cfg = HearthConfig::from_toml("").unwrap();
        assert_eq!(cfg.timeouts.selection_secs, 20);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = HearthConfig::from_toml(
            r#"
            [timeouts]
            focus_secs = 90

            [storage]
            dir = "/var/lib/hearth"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timeouts.focus_secs, 90);
        assert_eq!(cfg.timeouts.selection_secs, 20);
        assert_eq!(cfg.storage.dir, Some(PathBuf::from("/var/lib/hearth")));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = HearthConfig::from_toml("[timeouts]\nselection_secs = 0\n").unwrap_err();
        assert!(matches!(err, HearthError::Config(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = HearthConfig::from_toml("[timeouts\n").unwrap_err();
        assert!(matches!(err, HearthError::TomlParse(_)));
    }
}
