//! Runtime settings consumed by the source
//!
//! Two preferences drive the core: the API credential (empty string means
//! anonymous mode, which hides the authenticated menu branches) and the
//! playback method selector. The store is YAML-file backed with
//! auto-persisted defaults; the host's settings UI writes the same file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

/// Playback method preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    /// Resolve the streaming URL (default)
    #[default]
    Stream,
    /// Prefer the direct download URL when the track allows it
    Download,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SettingsData {
    /// OAuth credential; empty means anonymous mode
    #[serde(default)]
    api_token: String,
    /// Playback method selector
    #[serde(default)]
    playback_mode: PlaybackMode,
}

/// Settings store shared by handle across the source components
#[derive(Debug)]
pub struct Settings {
    path: Option<PathBuf>,
    data: RwLock<SettingsData>,
}

impl Settings {
    /// Create an in-memory store with defaults (tests, examples)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(SettingsData::default()),
        }
    }

    /// Load settings from a YAML file, creating it with defaults if absent
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let data = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings file {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Failed to parse settings file {}", path.display()))?
        } else {
            debug!("Settings file {} absent, writing defaults", path.display());
            let defaults = SettingsData::default();
            let raw = serde_yaml::to_string(&defaults)?;
            std::fs::write(&path, raw)
                .with_context(|| format!("Failed to create settings file {}", path.display()))?;
            defaults
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Persist the current values when file-backed
    pub fn save(&self) -> Result<()> {
        if let Some(ref path) = self.path {
            let raw = {
                let data = self.data.read().unwrap();
                serde_yaml::to_string(&*data)?
            };
            std::fs::write(path, raw)
                .with_context(|| format!("Failed to write settings file {}", path.display()))?;
        }
        Ok(())
    }

    /// API credential, `None` when running anonymous
    pub fn api_token(&self) -> Option<String> {
        let data = self.data.read().unwrap();
        if data.api_token.is_empty() {
            None
        } else {
            Some(data.api_token.clone())
        }
    }

    /// Whether a credential is configured
    pub fn is_authenticated(&self) -> bool {
        !self.data.read().unwrap().api_token.is_empty()
    }

    /// Set the API credential and persist
    pub fn set_api_token(&self, token: impl Into<String>) -> Result<()> {
        self.data.write().unwrap().api_token = token.into();
        self.save()
    }

    /// Playback method preference
    pub fn playback_mode(&self) -> PlaybackMode {
        self.data.read().unwrap().playback_mode
    }

    /// Set the playback method and persist
    pub fn set_playback_mode(&self, mode: PlaybackMode) -> Result<()> {
        self.data.write().unwrap().playback_mode = mode;
        self.save()
    }
}
