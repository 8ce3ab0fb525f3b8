//! Local leaderboard
//!
//! Top-10 results kept on the device, independent of the remote score store.
//! Persisted to a JSON file on native and LocalStorage on the web.

use serde::{Deserialize, Serialize};

use crate::settings::{GameMode, SettingsError};

pub const MAX_HIGH_SCORES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Waves spawned before the game ended
    pub wave: u32,
    #[serde(default)]
    pub mode: GameMode,
    /// Unix time in ms
    pub timestamp: f64,
}

/// Entries sorted by descending score; on a tie the older result ranks higher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "speed_calc_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Scoreless games never make the board
    pub fn qualifies(&self, score: u64) -> bool {
        score > 0
            && self
                .entries
                .get(MAX_HIGH_SCORES - 1)
                .is_none_or(|lowest| score > lowest.score)
    }

    /// Insert a finished game, returning its 1-based rank if it made the board
    pub fn add_score(
        &mut self,
        score: u64,
        wave: u32,
        mode: GameMode,
        timestamp: f64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let at = self.entries.partition_point(|e| e.score >= score);
        self.entries.insert(
            at,
            HighScoreEntry {
                score,
                wave,
                mode,
                timestamp,
            },
        );
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(at + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Best entry played in `mode`
    pub fn best_for(&self, mode: GameMode) -> Option<&HighScoreEntry> {
        self.entries.iter().find(|e| e.mode == mode)
    }

    /// Read the board from a JSON file. A missing or corrupt file gives an empty board.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(_) => {
                log::info!("No high scores at {}, starting fresh", path.display());
                return Self::new();
            }
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt high scores at {}: {e}", path.display());
            Self::new()
        })
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), SettingsError> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        crate::platform::storage_get(Self::STORAGE_KEY)
            .and_then(|json| serde_json::from_str(&json).ok())
            .unwrap_or_else(|| {
                log::info!("No stored high scores, starting fresh");
                Self::new()
            })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), SettingsError> {
        let json = serde_json::to_string(self)?;
        if !crate::platform::storage_set(Self::STORAGE_KEY, &json) {
            return Err(SettingsError::StorageUnavailable);
        }
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}
