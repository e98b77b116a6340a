use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Serde(serde_json::Error),
    ProjectDir,
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStyle {
    #[default]
    Wiki,
    Markdown,
}

/// Which end of an auto-created canvas edge carries the arrow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowTo {
    From,
    #[default]
    End,
    Both,
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Folder for new notes; empty means the vault root.
    pub default_folder: String,
    pub link_style: LinkStyle,
    /// Wire an edge from the source note's node to the dropped node.
    pub auto_link: bool,
    pub arrow_to: ArrowTo,
    pub default_link_label: Option<String>,
    /// Per-file budget for the metadata-cache wait during cross-reference
    /// propagation.
    pub propagation_wait_ms: u64,
    /// Whether an abandoned wait is surfaced as a warning or stays silent.
    pub warn_on_timeout: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_folder: String::new(),
            link_style: LinkStyle::default(),
            auto_link: false,
            arrow_to: ArrowTo::default(),
            default_link_label: None,
            propagation_wait_ms: 1000,
            warn_on_timeout: true,
        }
    }
}

pub struct SettingsStore {
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn default_store() -> Result<Self, SettingsError> {
        let project_dirs =
            ProjectDirs::from("app", "cardnote", "CardNote").ok_or(SettingsError::ProjectDir)?;
        let config_dir = project_dirs.config_dir();
        Ok(Self::new(config_dir.join("settings.json")))
    }

    pub fn load(&self) -> Result<Settings, SettingsError> {
        if !self.config_path.exists() {
            return Ok(Settings::default());
        }
        let raw = fs::read_to_string(&self.config_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, data)?;
        Ok(())
    }
}
