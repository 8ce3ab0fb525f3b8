//! Game settings and preferences
//!
//! Persisted as JSON: a file on native, LocalStorage on the web.

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::Operation;
use crate::tuning::Tuning;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
    #[error("browser storage unavailable")]
    StorageUnavailable,
}

/// Which operation the waves use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Add,
    Subtract,
    Multiply,
    Divide,
    Square,
    /// Random operation per wave
    #[default]
    Mixed,
}

impl GameMode {
    /// Identifier stored with reported scores
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Add => "add",
            GameMode::Subtract => "subtract",
            GameMode::Multiply => "multiply",
            GameMode::Divide => "divide",
            GameMode::Square => "square",
            GameMode::Mixed => "mixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mixed" | "all" => Some(GameMode::Mixed),
            other => Operation::from_str(other).map(GameMode::from),
        }
    }

    /// Fixed operation, `None` for mixed
    pub fn operation(&self) -> Option<Operation> {
        match self {
            GameMode::Add => Some(Operation::Add),
            GameMode::Subtract => Some(Operation::Subtract),
            GameMode::Multiply => Some(Operation::Multiply),
            GameMode::Divide => Some(Operation::Divide),
            GameMode::Square => Some(Operation::Square),
            GameMode::Mixed => None,
        }
    }

    pub fn pick_operation<R: Rng + ?Sized>(&self, rng: &mut R) -> Operation {
        self.operation().unwrap_or_else(|| {
            *Operation::ALL
                .choose(rng)
                .unwrap_or(&Operation::Add)
        })
    }

    /// Whether a record with this operation name belongs to the mode
    pub fn accepts(&self, operation: &str) -> bool {
        match self.operation() {
            Some(op) => Operation::from_str(operation) == Some(op),
            // Mixed keeps everything; unknown names fail later and get replaced
            None => true,
        }
    }
}

impl From<Operation> for GameMode {
    fn from(op: Operation) -> Self {
        match op {
            Operation::Add => GameMode::Add,
            Operation::Subtract => GameMode::Subtract,
            Operation::Multiply => GameMode::Multiply,
            Operation::Divide => GameMode::Divide,
            Operation::Square => GameMode::Square,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: GameMode,
    /// Signed-in user; `None` plays anonymously and reports nothing
    pub user_id: Option<String>,
    pub tuning: Tuning,
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "speed_calc_settings";

    /// Parse and validate settings JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.tuning.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings, falling back to defaults on any problem
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default(path: &std::path::Path) -> Self {
        match Self::load_from(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring settings at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let Some(json) = crate::platform::storage_get(Self::STORAGE_KEY) else {
            log::info!("Using default settings");
            return Self::default();
        };
        Self::from_json(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring stored settings: {e}");
            Self::default()
        })
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), SettingsError> {
        let json = serde_json::to_string(self)?;
        if !crate::platform::storage_set(Self::STORAGE_KEY, &json) {
            return Err(SettingsError::StorageUnavailable);
        }
        log::info!("Settings saved");
        Ok(())
    }
}
