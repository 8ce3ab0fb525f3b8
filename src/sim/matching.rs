//! Selection and match evaluation
//!
//! Taps toggle blocks in and out of the selection (square replaces it). After
//! every change the selected values are combined with the wave's operation and
//! compared to the target. Any match clears the whole wave.

use super::state::{BlockId, GameEvent, GameState, Operation};
use crate::consts::POINTS_PER_BLOCK;

impl Operation {
    /// Combine selected values, or `None` if the selection size has no result
    pub fn evaluate(&self, values: &[u32]) -> Option<u32> {
        match (self, values) {
            (Operation::Add, [_, ..]) if values.len() <= 3 => {
                values.iter().try_fold(0u32, |acc, v| acc.checked_add(*v))
            }
            (Operation::Subtract, [a, b]) => Some(a.abs_diff(*b)),
            (Operation::Multiply, [a, b]) => a.checked_mul(*b),
            (Operation::Divide, [a, b]) => {
                let (larger, smaller) = if a >= b { (*a, *b) } else { (*b, *a) };
                larger.checked_div(smaller)
            }
            (Operation::Square, [v]) => v.checked_mul(*v),
            _ => None,
        }
    }

    /// Whether `values` reach `target`. Non-square results must be positive.
    pub fn is_match(&self, values: &[u32], target: u32) -> bool {
        match self.evaluate(values) {
            Some(result) if *self == Operation::Square => result == target,
            Some(result) => result > 0 && result == target,
            None => false,
        }
    }
}

/// What a tap did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Not playing, unknown block, or selection already full
    Ignored,
    Selected,
    Deselected,
    /// The wave was cleared
    Matched { blocks: usize, gained: u64 },
}

/// Apply a tap on `id` to the live wave
pub fn select(state: &mut GameState, id: &BlockId) -> SelectOutcome {
    if !state.is_playing() || state.block(id).is_none() {
        return SelectOutcome::Ignored;
    }

    let operation = state.operation;
    let outcome = if operation == Operation::Square {
        // Single-selection mode: the tap replaces whatever was selected
        state.selection.clear();
        state.selection.push(id.clone());
        SelectOutcome::Selected
    } else if let Some(pos) = state.selection.iter().position(|s| s == id) {
        state.selection.remove(pos);
        SelectOutcome::Deselected
    } else if state.selection.len() >= operation.max_selection() {
        let full = state.selection.len();
        log::debug!("Selection full ({full}), ignoring tap on {id}");
        return SelectOutcome::Ignored;
    } else {
        state.selection.push(id.clone());
        SelectOutcome::Selected
    };

    let values = state.selected_values();
    if operation.is_match(&values, state.target) {
        let blocks = values.len();
        let gained = blocks as u64 * POINTS_PER_BLOCK + u64::from(state.target);
        state.score += gained;
        state.blocks.clear();
        state.selection.clear();
        state.events.push(GameEvent::Matched {
            blocks,
            gained,
            score: state.score,
        });
        log::debug!(
            "Matched {} = {} with {:?} (+{gained}, score {})",
            operation,
            state.target,
            values,
            state.score
        );
        return SelectOutcome::Matched { blocks, gained };
    }

    state.events.push(GameEvent::SelectionChanged {
        selected: state.selection.len(),
    });
    outcome
}
