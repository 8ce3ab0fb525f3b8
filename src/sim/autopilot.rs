//! Idle/demo player
//!
//! Works out which taps clear the live wave. Used by the headless demo and
//! for attract-mode play on the web.

use super::question::solve;
use super::state::{Block, BlockId, GameState, Operation};

/// Taps that turn the current selection into a winning one, in order
///
/// Stray selected blocks are tapped off first. Returns `None` when nothing is
/// playing or the wave has no solution.
pub fn plan_taps(state: &GameState) -> Option<Vec<BlockId>> {
    if !state.is_playing() {
        return None;
    }
    plan(
        state.operation,
        state.target,
        &state.blocks,
        &state.selection,
    )
}

/// Same as [`plan_taps`] for a wave described by its parts
pub fn plan(
    operation: Operation,
    target: u32,
    blocks: &[Block],
    selection: &[BlockId],
) -> Option<Vec<BlockId>> {
    if blocks.is_empty() {
        return None;
    }

    let values: Vec<u32> = blocks.iter().map(|b| b.value).collect();
    let lanes = solve(operation, &values, target)?;
    let wanted: Vec<BlockId> = lanes.iter().map(|&i| blocks[i].id.clone()).collect();

    if operation == Operation::Square {
        return Some(wanted);
    }

    let mut taps: Vec<BlockId> = selection
        .iter()
        .filter(|id| !wanted.contains(id))
        .cloned()
        .collect();
    taps.extend(wanted.into_iter().filter(|id| !selection.contains(id)));
    Some(taps)
}
