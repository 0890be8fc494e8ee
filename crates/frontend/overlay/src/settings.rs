use crate::OverlayError;
use overlay_core::keys;
use overlay_core::logging::{log, LogCategory, LogLevel};
use overlay_core::KeyCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Menu navigation bindings, by key name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuBindings {
    pub up: String,
    pub down: String,
    pub decrease: String,
    pub increase: String,
    pub activate: String,
    /// Hardware scancode that shows or hides the menu
    pub toggle_scancode: u16,
    /// Hardware scancode of the power switch; ends the session
    pub shutdown_scancode: u16,
}

impl Default for MenuBindings {
    fn default() -> Self {
        Self {
            up: "Up".to_string(),
            down: "Down".to_string(),
            decrease: "Left".to_string(),
            increase: "Right".to_string(),
            activate: "LeftCtrl".to_string(),
            toggle_scancode: 4,
            shutdown_scancode: 107,
        }
    }
}

/// Button emulated by a key, 0 = left, 1 = right, 2 = middle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonBinding {
    pub key: String,
    pub button: u8,
}

/// Virtual pointer bindings, by key name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerBindings {
    pub toggle: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub buttons: Vec<ButtonBinding>,
    /// Keys that belong to other overlays and are never claimed
    pub passthrough: Vec<String>,
}

impl Default for PointerBindings {
    fn default() -> Self {
        let button = |key: &str, button| ButtonBinding {
            key: key.to_string(),
            button,
        };
        Self {
            toggle: "Backspace".to_string(),
            left: "Left".to_string(),
            right: "Right".to_string(),
            up: "Up".to_string(),
            down: "Down".to_string(),
            buttons: vec![
                button("LeftCtrl", 0),
                button("LeftAlt", 2),
                button("Space", 2),
                button("LeftShift", 1),
            ],
            passthrough: vec!["Enter".to_string(), "Escape".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub menu: MenuBindings,
    pub pointer: PointerBindings,
}

impl OverlaySettings {
    /// Parse settings from JSON; absent fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, OverlayError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or malformed
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                log(LogCategory::Config, LogLevel::Info, || {
                    format!("no settings at {}, using defaults", path.display())
                });
                return Self::default();
            }
        };
        match Self::from_json(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                log(LogCategory::Config, LogLevel::Warn, || {
                    format!("failed to parse {}: {}. Using defaults.", path.display(), e)
                });
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), OverlayError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Resolve a bound key name, reporting the binding that failed
pub(crate) fn resolve(name: &str) -> Result<KeyCode, OverlayError> {
    keys::from_name(name).ok_or_else(|| {
        log(LogCategory::Config, LogLevel::Error, || {
            format!("unbound key name {:?}", name)
        });
        OverlayError::UnknownKey(name.to_string())
    })
}
