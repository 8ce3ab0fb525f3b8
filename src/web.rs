//! Browser bindings
//!
//! The page owns the render loop: it calls `tick()` from its frame timer and
//! forwards taps to `select()`. Sessions are anonymous on the web; results go
//! to the local leaderboard only.

use wasm_bindgen::prelude::*;

use crate::arcade::Arcade;
use crate::highscores::HighScores;
use crate::settings::Settings;
use crate::sim::{BlockId, GamePhase, QuestionProvider, SelectOutcome, TickOutcome, static_bank};

#[wasm_bindgen]
pub struct WebArcade {
    arcade: Arcade,
    high_scores: HighScores,
}

#[wasm_bindgen]
impl WebArcade {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebArcade {
        crate::platform::init_logging();
        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let mode = settings.mode.as_str();
        log::info!("Speed Calc starting ({mode} mode, seed {seed})");
        let provider = QuestionProvider::with_bank(settings.mode, static_bank());
        WebArcade {
            arcade: Arcade::new(provider, settings.tuning, seed),
            high_scores: HighScores::load(),
        }
    }

    pub fn start(&mut self) {
        self.arcade.start();
    }

    pub fn pause(&mut self) {
        self.arcade.pause();
    }

    pub fn resume(&mut self) {
        self.arcade.resume();
    }

    /// Returns true when the tap cleared the wave
    pub fn select(&mut self, id: &str) -> bool {
        matches!(
            self.arcade.select(&BlockId::from(id)),
            SelectOutcome::Matched { .. }
        )
    }

    /// Returns true on the tick that ended the game
    pub fn tick(&mut self) -> bool {
        let landed = self.arcade.tick() == TickOutcome::Landed;
        if landed {
            self.record_high_score();
        }
        landed
    }

    /// Leave the game screen mid-run
    pub fn quit(&mut self) {
        let phase = self.arcade.state().phase;
        if matches!(phase, GamePhase::Playing | GamePhase::Paused) {
            self.arcade.game_over();
            self.record_high_score();
        }
    }

    /// Current state as JSON for the renderer
    pub fn snapshot_json(&self) -> String {
        let snapshot = self.arcade.snapshot();
        serde_json::to_string(&snapshot).unwrap_or_default()
    }

    /// Events since the last call, as a JSON array
    pub fn events_json(&mut self) -> String {
        let events = self.arcade.drain_events();
        serde_json::to_string(&events).unwrap_or_default()
    }

    pub fn high_scores_json(&self) -> String {
        serde_json::to_string(&self.high_scores).unwrap_or_default()
    }

    fn record_high_score(&mut self) {
        let state = self.arcade.state();
        let rank = self.high_scores.add_score(
            state.score,
            state.wave_index,
            self.arcade.mode(),
            crate::platform::now_ms(),
        );
        if let Some(rank) = rank {
            log::info!("New high score #{rank}: {}", state.score);
            if let Err(e) = self.high_scores.save() {
                log::warn!("Could not save high scores: {e}");
            }
        }
    }
}

impl Default for WebArcade {
    fn default() -> Self {
        Self::new()
    }
}
