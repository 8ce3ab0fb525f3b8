//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed tick only
//! - Seeded RNG only
//! - Stable iteration order (by lane)
//! - No rendering, timer or platform dependencies

pub mod autopilot;
pub mod matching;
pub mod question;
pub mod state;
pub mod tick;
pub mod wave;

pub use autopilot::plan_taps;
pub use matching::{SelectOutcome, select};
pub use question::{
    DataError, Question, QuestionProvider, QuestionRecord, generate, solve, static_bank,
};
pub use state::{Block, BlockColor, BlockId, GameEvent, GamePhase, GameState, Operation};
pub use tick::{TickOutcome, difficulty_multiplier, tick};
pub use wave::spawn_wave;
