use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
    time::Duration,
};

use crate::workspace::WorkspaceConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveSettings {
    pub box_debounce_ms: u64,
    pub anchor_debounce_ms: u64,
    pub draft_debounce_ms: u64,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            box_debounce_ms: 1000,
            anchor_debounce_ms: 500,
            draft_debounce_ms: 1000,
        }
    }
}

impl From<&AutosaveSettings> for WorkspaceConfig {
    fn from(settings: &AutosaveSettings) -> Self {
        Self {
            box_debounce: Duration::from_millis(settings.box_debounce_ms),
            anchor_debounce: Duration::from_millis(settings.anchor_debounce_ms),
            draft_debounce: Duration::from_millis(settings.draft_debounce_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerSettings {
    pub freewrite_seconds: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            freewrite_seconds: 600,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub sidebar_collapsed: bool,
    pub autosave: AutosaveSettings,
    pub timer: TimerSettings,
}

/// JSON-file backed settings. A missing or unreadable file yields defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> UserSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.snapshot().sidebar_collapsed
    }

    pub fn workspace_config(&self) -> WorkspaceConfig {
        WorkspaceConfig::from(&self.snapshot().autosave)
    }

    pub fn freewrite_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.snapshot().timer.freewrite_seconds))
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) -> Result<()> {
        self.update(|settings| settings.sidebar_collapsed = collapsed)
    }

    pub fn update_autosave(&self, autosave: AutosaveSettings) -> Result<()> {
        self.update(|settings| settings.autosave = autosave)
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
