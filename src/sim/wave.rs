//! Wave spawning
//!
//! Turns a [`Question`] into one block per lane, all starting above the
//! visible field.

use rand::Rng;
use rand::seq::IndexedRandom;

use super::question::Question;
use super::state::{Block, BlockColor, BlockId, GameEvent, GameState};
use crate::tuning::Tuning;

/// Spawn the blocks for `question` and make it the live wave
///
/// Returns `false` (and changes nothing) while a wave is still alive, since
/// only one wave may exist at a time.
pub fn spawn_wave(state: &mut GameState, question: Question, tuning: &Tuning) -> bool {
    if !state.blocks.is_empty() {
        log::warn!(
            "Refusing to spawn over a live wave ({} blocks left)",
            state.blocks.len()
        );
        return false;
    }

    state.wave_index += 1;
    let wave = state.wave_index;
    let token: u32 = state.rng_mut().random();

    let blocks: Vec<Block> = question
        .operands()
        .iter()
        .enumerate()
        .map(|(lane, &value)| Block {
            id: BlockId::new(wave, token, lane),
            value,
            lane,
            y: tuning.spawn_y,
            color: *BlockColor::ALL
                .choose(state.rng_mut())
                .unwrap_or(&BlockColor::Blue),
        })
        .collect();

    state.blocks = blocks;
    state.selection.clear();
    state.operation = question.operation();
    state.target = question.target();
    state.events.push(GameEvent::WaveSpawned {
        wave,
        operation: state.operation,
        target: state.target,
    });

    log::debug!(
        "Wave {wave}: {} -> {} over {:?}",
        state.operation,
        state.target,
        question.operands()
    );
    true
}
