//! Configurator settings file
//!
//! Everything the host would otherwise hard-code: the entry list, timing and
//! analog thresholds. A missing file yields the defaults so the binary always
//! starts.

use crate::binding::candidate::KeyCode;
use crate::binding::entry::{AxisEntry, ButtonEntry};
use crate::binding::service::ConfiguratorSettings;
use crate::controller::CollectorSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const APP_DIR: &str = "padbind";
const CONFIG_FILE: &str = "configurator.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ConfiguratorConfig {
    pub buttons_first: bool,
    pub hold_to_skip_ms: u64,
    pub axis_threshold: f32,
    pub connect_delay_ms: u64,
    pub cancel_key: KeyCode,
    pub joystick_deadzone: f32,
    pub buttons: Vec<ButtonEntry>,
    pub axes: Vec<AxisEntry>,
}

impl Default for ConfiguratorConfig {
    fn default() -> Self {
        Self {
            buttons_first: true,
            hold_to_skip_ms: 2000,
            axis_threshold: 0.75,
            connect_delay_ms: 0,
            cancel_key: KeyCode::ESCAPE,
            joystick_deadzone: 0.2,
            buttons: vec![
                ButtonEntry::new("accept", "Accept"),
                ButtonEntry::new("cancel", "Cancel"),
                ButtonEntry::new("pause", "Pause"),
            ],
            axes: vec![
                AxisEntry::new("horizontal", "Horizontal movement", "left", "right"),
                AxisEntry::new("vertical", "Vertical movement", "up", "down"),
            ],
        }
    }
}

impl ConfiguratorConfig {
    /// `<config_dir>/padbind/configurator.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| {
                warn!("Could not determine config directory, using current directory");
                PathBuf::from(".")
            })
            .join(APP_DIR)
            .join(CONFIG_FILE)
    }

    /// Reads and validates the file, falling back to defaults if it does not exist
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path).await.map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        if !exists {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        debug!(
            "Config: {} buttons, {} axes",
            config.buttons.len(),
            config.axes.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.axis_threshold > 0.0 && self.axis_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "axis_threshold must be in (0, 1], got {}",
                self.axis_threshold
            )));
        }
        if !(0.0..1.0).contains(&self.joystick_deadzone) {
            return Err(ConfigError::Invalid(format!(
                "joystick_deadzone must be in [0, 1), got {}",
                self.joystick_deadzone
            )));
        }
        if self.joystick_deadzone >= self.axis_threshold {
            return Err(ConfigError::Invalid(format!(
                "joystick_deadzone {} must be below axis_threshold {}",
                self.joystick_deadzone, self.axis_threshold
            )));
        }
        if self.hold_to_skip_ms == 0 {
            return Err(ConfigError::Invalid(
                "hold_to_skip_ms must not be zero".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let ids = self
            .buttons
            .iter()
            .map(|b| b.id.as_str())
            .chain(self.axes.iter().map(|a| a.id.as_str()));
        for id in ids {
            if id.trim().is_empty() {
                return Err(ConfigError::Invalid("entry id must not be empty".to_string()));
            }
            if !seen.insert(id) {
                return Err(ConfigError::Invalid(format!("duplicate entry id {}", id)));
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> ConfiguratorSettings {
        ConfiguratorSettings {
            buttons_first: self.buttons_first,
            hold_to_skip: Duration::from_millis(self.hold_to_skip_ms),
            axis_threshold: self.axis_threshold,
            cancel_key: self.cancel_key,
            connect_delay: Duration::from_millis(self.connect_delay_ms),
        }
    }

    pub fn collector_settings(&self) -> CollectorSettings {
        CollectorSettings {
            joystick_deadzone: self.joystick_deadzone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = ConfiguratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.settings().hold_to_skip, Duration::from_secs(2));
        assert_eq!(config.settings().cancel_key, KeyCode(27));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ConfiguratorConfig::from_toml_str(
            r#"
            buttons_first = false
            connect_delay_ms = 500

            [[buttons]]
            id = "jump"
            description = "Jump"
            "#,
        )
        .unwrap();

        assert!(!config.buttons_first);
        assert_eq!(config.settings().connect_delay, Duration::from_millis(500));
        assert_eq!(config.buttons.len(), 1);
        assert_eq!(config.buttons[0].accepted, None);
        assert_eq!(config.axes.len(), 2);
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            "axis_threshold = 0.0",
            "axis_threshold = 1.5",
            "joystick_deadzone = 0.8",
            "hold_to_skip_ms = 0",
            "[[buttons]]\nid = \"\"\ndescription = \"Nothing\"",
            "[[buttons]]\nid = \"move\"\ndescription = \"Move\"\n\
             [[axes]]\nid = \"move\"\ndescription = \"Move\"\nminus_label = \"l\"\nplus_label = \"r\"",
        ];

        for content in bad {
            assert!(
                matches!(
                    ConfiguratorConfig::from_toml_str(content),
                    Err(ConfigError::Invalid(_))
                ),
                "accepted: {}",
                content
            );
        }
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfiguratorConfig::load(&dir.path().join("configurator.toml"))
            .await
            .unwrap();
        assert_eq!(config, ConfiguratorConfig::default());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("configurator.toml");
        tokio::fs::write(&path, "cancel_key = 81\n").await.unwrap();

        let config = ConfiguratorConfig::load(&path).await.unwrap();
        assert_eq!(config.cancel_key, KeyCode(81));
    }
}
