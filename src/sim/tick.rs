//! Fixed timestep gravity tick
//!
//! Each tick moves every live block down by `base_gravity` scaled with the
//! score, then checks the floor against the updated positions.

use super::state::GameState;
use crate::consts::DIFFICULTY_SCORE_SCALE;
use crate::tuning::Tuning;

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; nothing moved
    Idle,
    /// Blocks moved and none reached the floor
    Falling,
    /// A block crossed the floor on this tick and the session ended
    Landed,
}

/// Gravity scale for a score. Uncapped, so very high scores become unplayable.
#[inline]
pub fn difficulty_multiplier(score: u64) -> f32 {
    1.0 + score as f32 / DIFFICULTY_SCORE_SCALE
}

/// Advance the game state by one fixed tick
pub fn tick(state: &mut GameState, tuning: &Tuning) -> TickOutcome {
    if !state.is_playing() {
        return TickOutcome::Idle;
    }

    state.time_ticks += 1;

    let step = tuning.base_gravity * difficulty_multiplier(state.score);
    for block in &mut state.blocks {
        block.y += step;
    }

    let floor = tuning.floor_y();
    if let Some(block) = state.blocks.iter().find(|b| b.y > floor) {
        log::info!(
            "Block {} (value {}) hit the floor at tick {}",
            block.id,
            block.value,
            state.time_ticks
        );
        if state.enter_game_over() {
            return TickOutcome::Landed;
        }
    }

    TickOutcome::Falling
}
