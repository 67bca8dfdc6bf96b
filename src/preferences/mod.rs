//! Reader display preferences and locally held API keys

pub mod smart_copy;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{KeyValueStore, PREFERENCES_KEY, load_record, save_record};

/// Body text size
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FontSize::Small => "small",
            FontSize::Medium => "medium",
            FontSize::Large => "large",
        };
        f.write_str(name)
    }
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" | "s" => Ok(FontSize::Small),
            "medium" | "m" => Ok(FontSize::Medium),
            "large" | "l" => Ok(FontSize::Large),
            other => Err(format!("unknown font size {other:?} (small, medium, large)")),
        }
    }
}

/// Persisted preferences record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesState {
    pub font_size: FontSize,
    pub reduced_motion: bool,
    pub show_reading_progress: bool,
    pub show_estimated_time: bool,
    /// Complete a module automatically once it is scrolled to the end
    pub auto_mark_complete: bool,
    /// Substitute stored API keys into copied code
    pub inject_keys: bool,
    /// Provider id to API key
    pub api_keys: BTreeMap<String, String>,
    pub font_sans: String,
    pub font_mono: String,
}

impl Default for PreferencesState {
    fn default() -> Self {
        Self {
            font_size: FontSize::Medium,
            reduced_motion: false,
            show_reading_progress: true,
            show_estimated_time: true,
            auto_mark_complete: false,
            inject_keys: true,
            api_keys: BTreeMap::new(),
            font_sans: "inter".to_string(),
            font_mono: "jetbrains".to_string(),
        }
    }
}

/// Write-through store for [`PreferencesState`]
pub struct PreferencesStore {
    state: PreferencesState,
    storage: Arc<dyn KeyValueStore>,
}

impl PreferencesStore {
    /// Load the persisted record
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let state = load_record(storage.as_ref(), PREFERENCES_KEY);
        Self { state, storage }
    }

    /// Current preferences
    pub fn state(&self) -> &PreferencesState {
        &self.state
    }

    /// Write the whole record to storage
    pub fn flush(&self) {
        save_record(self.storage.as_ref(), PREFERENCES_KEY, &self.state);
    }

    fn update(&mut self, apply: impl FnOnce(&mut PreferencesState)) {
        apply(&mut self.state);
        self.flush();
    }

    pub fn set_font_size(&mut self, size: FontSize) {
        self.update(|s| s.font_size = size);
    }

    pub fn set_reduced_motion(&mut self, value: bool) {
        self.update(|s| s.reduced_motion = value);
    }

    pub fn set_show_reading_progress(&mut self, value: bool) {
        self.update(|s| s.show_reading_progress = value);
    }

    pub fn set_show_estimated_time(&mut self, value: bool) {
        self.update(|s| s.show_estimated_time = value);
    }

    pub fn set_auto_mark_complete(&mut self, value: bool) {
        self.update(|s| s.auto_mark_complete = value);
    }

    pub fn set_inject_keys(&mut self, value: bool) {
        self.update(|s| s.inject_keys = value);
    }

    pub fn set_font_sans(&mut self, font: &str) {
        self.update(|s| s.font_sans = font.to_string());
    }

    pub fn set_font_mono(&mut self, font: &str) {
        self.update(|s| s.font_mono = font.to_string());
    }

    /// Store the API key for a provider; an empty key clears it
    pub fn set_api_key(&mut self, provider: &str, key: &str) {
        let key = key.trim();
        self.update(|s| {
            if key.is_empty() {
                s.api_keys.remove(provider);
            } else {
                s.api_keys.insert(provider.to_string(), key.to_string());
            }
        });
    }

    /// Stored key for a provider
    pub fn api_key(&self, provider: &str) -> Option<&str> {
        self.state.api_keys.get(provider).map(String::as_str).filter(|k| !k.is_empty())
    }
}
