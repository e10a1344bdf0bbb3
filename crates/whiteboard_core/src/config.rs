use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::element::WELCOME_NOTE_TEXT;

// ---------------------------------------------------------------------------
// WhiteboardConfig
// ---------------------------------------------------------------------------

/// Service configuration stored at `~/.whiteboard/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteboardConfig {
    // Initial document
    pub welcome_text: String,
    pub welcome_x: f64,
    pub welcome_y: f64,

    // Connection graph
    /// When set, removing an element also strips it from every flow node's
    /// connections. Off by default: dangling edges are kept.
    pub cascade_edges_on_remove: bool,

    // Viewer relay
    pub relay_capacity: usize,

    // General
    pub log_level: String,
}

impl Default for WhiteboardConfig {
    fn default() -> Self {
        Self {
            welcome_text: WELCOME_NOTE_TEXT.into(),
            welcome_x: 100.0,
            welcome_y: 150.0,
            cascade_edges_on_remove: false,
            relay_capacity: 64,
            log_level: "info".into(),
        }
    }
}

impl WhiteboardConfig {
    /// Returns the base config directory: `~/.whiteboard/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".whiteboard"))
    }

    /// Returns the config file path: `~/.whiteboard/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.whiteboard/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Loads config from the default location, or creates it if missing.
    pub fn load() -> Result<Self> {
        let base = Self::base_dir()?;
        std::fs::create_dir_all(&base)
            .with_context(|| format!("Failed to create directory: {}", base.display()))?;
        Self::load_from_path(&Self::config_path()?)
    }

    /// Load config from a specific file path, writing defaults there when the
    /// file does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Saves config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let config = WhiteboardConfig::default();
        assert_eq!(config.welcome_text, WELCOME_NOTE_TEXT);
        assert_eq!((config.welcome_x, config.welcome_y), (100.0, 150.0));
        assert!(!config.cascade_edges_on_remove);
        assert_eq!(config.relay_capacity, 64);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        assert!(!path.exists());

        let config = WhiteboardConfig::load_from_path(&path).unwrap();
        assert_eq!(config, WhiteboardConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn save_and_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");

        let config = WhiteboardConfig {
            cascade_edges_on_remove: true,
            relay_capacity: 8,
            welcome_text: "hi".into(),
            ..Default::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = WhiteboardConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{ "cascade_edges_on_remove": true }"#).unwrap();

        let loaded = WhiteboardConfig::load_from_path(&path).unwrap();
        assert!(loaded.cascade_edges_on_remove);
        assert_eq!(loaded.relay_capacity, 64);
        assert_eq!(loaded.log_level, "info");
    }

    #[test]
    fn corrupted_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = WhiteboardConfig::load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse"));
    }
}
