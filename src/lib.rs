//! Speed Calc - a falling-block arithmetic arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (questions, waves, gravity, matching)
//! - `arcade`: Session controller driving the simulation
//! - `persistence`: Best-effort score reporting to the record store
//! - `platform`: Browser/native platform abstraction
//! - `tuning`: Data-driven game balance

pub mod arcade;
pub mod generate;
pub mod highscores;
pub mod persistence;
pub mod platform;
#[cfg(not(target_arch = "wasm32"))]
pub mod runner;
pub mod settings;
pub mod sim;
pub mod tuning;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use arcade::{Arcade, Snapshot};
pub use highscores::HighScores;
pub use settings::{GameMode, Settings};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Number of lanes, and therefore blocks per wave
    pub const LANE_COUNT: usize = 5;

    /// Fixed gravity tick period (~60 Hz)
    pub const TICK_MS: u64 = 16;

    /// Play field dimensions (pixels)
    pub const PLAY_FIELD_HEIGHT: f32 = 600.0;
    /// Distance above the bottom edge at which a block counts as landed
    pub const FLOOR_MARGIN: f32 = 80.0;
    /// Spawn height, above the visible field
    pub const SPAWN_Y: f32 = -80.0;

    /// Pixels fallen per tick at difficulty 1.0
    pub const BASE_GRAVITY: f32 = 0.6;
    /// Score needed to add 1.0 to the difficulty multiplier
    pub const DIFFICULTY_SCORE_SCALE: f32 = 500.0;

    /// Operand range for generated and back-filled lanes
    pub const MIN_OPERAND: u32 = 1;
    pub const MAX_OPERAND: u32 = 9;

    /// Points per matched block (added to the target)
    pub const POINTS_PER_BLOCK: u64 = 10;
    /// Score per reported wave (`wave_reached = score / 50 + 1`)
    pub const SCORE_PER_WAVE: u64 = 50;
    /// Experience points awarded are `score / XP_DIVISOR`
    pub const XP_DIVISOR: u64 = 2;
}
