//! Persisted settings and their change notifications
//!
//! Key names match the extension's synced storage. Every toggle defaults to
//! on when it has never been written.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::SiteType;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Malformed configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Key {key} expects a {expected} value")]
    WrongType { key: String, expected: &'static str },
}

fn enabled() -> bool {
    true
}

// =============================================================================
// Stored Configuration
// =============================================================================

/// Per-page toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubOptions {
    #[serde(default = "enabled")]
    pub bing_main: bool,
    #[serde(default = "enabled")]
    pub bing_video: bool,
    #[serde(default = "enabled")]
    pub bing_image: bool,
    #[serde(default = "enabled")]
    pub bing_shop: bool,
    #[serde(default = "enabled")]
    pub bing_news: bool,
    #[serde(default = "enabled")]
    pub google_main: bool,
    #[serde(default = "enabled")]
    pub google_video: bool,
    #[serde(default = "enabled")]
    pub google_image: bool,
    #[serde(default = "enabled")]
    pub google_shop: bool,
    #[serde(default = "enabled")]
    pub google_news: bool,
    #[serde(default = "enabled")]
    pub google_shorts: bool,
}

impl Default for SubOptions {
    fn default() -> Self {
        Self {
            bing_main: true,
            bing_video: true,
            bing_image: true,
            bing_shop: true,
            bing_news: true,
            google_main: true,
            google_video: true,
            google_image: true,
            google_shop: true,
            google_news: true,
            google_shorts: true,
        }
    }
}

impl SubOptions {
    /// Storage key names, in persisted order.
    pub const KEYS: [&'static str; 11] = [
        "bing_main",
        "bing_video",
        "bing_image",
        "bing_shop",
        "bing_news",
        "google_main",
        "google_video",
        "google_image",
        "google_shop",
        "google_news",
        "google_shorts",
    ];

    fn slot(&mut self, key: &str) -> Option<&mut bool> {
        Some(match key {
            "bing_main" => &mut self.bing_main,
            "bing_video" => &mut self.bing_video,
            "bing_image" => &mut self.bing_image,
            "bing_shop" => &mut self.bing_shop,
            "bing_news" => &mut self.bing_news,
            "google_main" => &mut self.google_main,
            "google_video" => &mut self.google_video,
            "google_image" => &mut self.google_image,
            "google_shop" => &mut self.google_shop,
            "google_news" => &mut self.google_news,
            "google_shorts" => &mut self.google_shorts,
            _ => return None,
        })
    }
}

pub const STATUS_KEY: &str = "ngw4b_status";
pub const LIST_KEY: &str = "ngw4b_nglist";
pub const BING_KEY: &str = "enabled_bing";
pub const GOOGLE_KEY: &str = "enabled_google";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(rename = "ngw4b_status", default = "enabled")]
    pub enabled: bool,
    #[serde(rename = "ngw4b_nglist", default)]
    pub block_list: String,
    #[serde(rename = "enabled_bing", default = "enabled")]
    pub bing_enabled: bool,
    #[serde(rename = "enabled_google", default = "enabled")]
    pub google_enabled: bool,
    #[serde(flatten)]
    pub sub_options: SubOptions,
}

impl Default for StoredConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_list: String::new(),
            bing_enabled: true,
            google_enabled: true,
            sub_options: SubOptions::default(),
        }
    }
}

/// Which settings a change touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Touched {
    pub status: bool,
    pub list: bool,
    pub site: bool,
    pub sub_options: bool,
}

impl Touched {
    pub fn any(&self) -> bool {
        self.status || self.list || self.site || self.sub_options
    }
}

impl StoredConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn site_enabled(&self, site: SiteType) -> bool {
        match site {
            SiteType::Bing => self.bing_enabled,
            SiteType::Google => self.google_enabled,
        }
    }

    /// Fold a change notification into this configuration. A removed key
    /// falls back to its default. Unknown keys are ignored.
    pub fn apply(&mut self, changes: &StorageChanges) -> Result<Touched, ConfigError> {
        let mut touched = Touched::default();
        for (key, change) in &changes.0 {
            let value = change.new_value.as_ref();
            match key.as_str() {
                STATUS_KEY => {
                    self.enabled = bool_value(key, value)?;
                    touched.status = true;
                }
                LIST_KEY => {
                    self.block_list = match value {
                        None | Some(Value::Null) => String::new(),
                        Some(Value::String(text)) => text.clone(),
                        Some(_) => {
                            return Err(ConfigError::WrongType {
                                key: key.clone(),
                                expected: "string",
                            })
                        }
                    };
                    touched.list = true;
                }
                BING_KEY => {
                    self.bing_enabled = bool_value(key, value)?;
                    touched.site = true;
                }
                GOOGLE_KEY => {
                    self.google_enabled = bool_value(key, value)?;
                    touched.site = true;
                }
                other => {
                    if let Some(slot) = self.sub_options.slot(other) {
                        *slot = bool_value(key, value)?;
                        touched.sub_options = true;
                    }
                }
            }
        }
        Ok(touched)
    }
}

fn bool_value(key: &str, value: Option<&Value>) -> Result<bool, ConfigError> {
    match value {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ConfigError::WrongType {
            key: key.to_string(),
            expected: "boolean",
        }),
    }
}

// =============================================================================
// Change Notifications
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageChange {
    #[serde(rename = "oldValue", default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(rename = "newValue", default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

/// Key to old/new value, as delivered by the storage change event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageChanges(pub BTreeMap<String, StorageChange>);

impl StorageChanges {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Single-key change with only a new value.
    pub fn set(key: &str, value: Value) -> Self {
        let mut map = BTreeMap::new();
        map.insert(
            key.to_string(),
            StorageChange {
                old_value: None,
                new_value: Some(value),
            },
        );
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&StorageChange> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Tuning
// =============================================================================

fn default_debounce_ms() -> u64 {
    300
}

fn default_flicker_window_ms() -> u64 {
    3000
}

fn default_label() -> String {
    "Filtered".to_string()
}

/// Timing and presentation knobs that are not user settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuning {
    /// Quiet period before a mutation-triggered pass
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Upper bound on the flicker-prevention window
    #[serde(default = "default_flicker_window_ms")]
    pub flicker_window_ms: u64,
    /// Label shown on hidden cards in reveal mode
    #[serde(default = "default_label")]
    pub label: String,
}

impl Tuning {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            flicker_window_ms: default_flicker_window_ms(),
            label: default_label(),
        }
    }
}
