use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

// Theme preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
}

// Editor layout: one live hybrid view, or raw source next to a preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Hybrid,
    Split,
}

// App settings: simple preferences with no consistency requirements.
// `use_mock_store` selects the in-memory backend at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub notes_folder: Option<String>,
    pub font_size: f32,
    pub line_height: f32,
    pub theme: ThemeMode,
    pub font_family: String,
    pub view_mode: ViewMode,
    pub use_mock_store: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notes_folder: None,
            font_size: 16.0,
            line_height: 1.6,
            theme: ThemeMode::Dark,
            font_family: "sans".to_string(),
            view_mode: ViewMode::Hybrid,
            use_mock_store: false,
        }
    }
}

// Get settings file path, creating the app config dir as needed
pub fn settings_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config directory available"))?
        .join("tauri-md");
    fs::create_dir_all(&config_dir)?;
    Ok(config_dir.join("settings.json"))
}

// Load settings from disk; any failure falls back to defaults
pub fn load_settings(path: &Path) -> Settings {
    if path.exists() {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    } else {
        Settings::default()
    }
}

// Save settings to disk
pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)?;
    fs::write(path, content)?;
    Ok(())
}
