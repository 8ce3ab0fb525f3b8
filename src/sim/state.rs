//! Game state and core simulation types
//!
//! Everything a running session mutates lives in [`GameState`]. It is owned by
//! one controller and only changed through `tick`, `select` and wave spawns.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Arithmetic operation the player must perform on a wave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Divide,
    Square,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Add,
        Operation::Subtract,
        Operation::Multiply,
        Operation::Divide,
        Operation::Square,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Subtract => "subtract",
            Operation::Multiply => "multiply",
            Operation::Divide => "divide",
            Operation::Square => "square",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "add" | "addition" | "+" => Some(Operation::Add),
            "subtract" | "subtraction" | "-" => Some(Operation::Subtract),
            "multiply" | "multiplication" | "*" | "x" => Some(Operation::Multiply),
            "divide" | "division" | "/" => Some(Operation::Divide),
            "square" | "squares" => Some(Operation::Square),
            _ => None,
        }
    }

    /// Largest selection the operation accepts
    pub fn max_selection(&self) -> usize {
        match self {
            Operation::Add => 3,
            Operation::Subtract | Operation::Multiply | Operation::Divide => 2,
            Operation::Square => 1,
        }
    }

    /// Smallest selection the operation produces a result for
    pub fn min_selection(&self) -> usize {
        match self {
            Operation::Add | Operation::Square => 1,
            Operation::Subtract | Operation::Multiply | Operation::Divide => 2,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique block identifier (`w<wave>-<token>-<lane>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(wave: u32, token: u32, lane: usize) -> Self {
        Self(format!("w{wave}-{token:08x}-{lane}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BlockId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Cosmetic block color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl BlockColor {
    pub const ALL: [BlockColor; 6] = [
        BlockColor::Red,
        BlockColor::Orange,
        BlockColor::Yellow,
        BlockColor::Green,
        BlockColor::Blue,
        BlockColor::Purple,
    ];
}

/// A falling number block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub value: u32,
    /// Lane index in `0..LANE_COUNT`
    pub lane: usize,
    /// Vertical position in pixels (grows downward). Only gravity writes it.
    pub y: f32,
    pub color: BlockColor,
}

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Waiting for the start action
    NotStarted,
    /// Blocks are falling
    Playing,
    /// Gravity and taps suspended
    Paused,
    /// A block reached the floor (terminal for this session)
    GameOver,
}

/// Notable things that happened since the last drain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    WaveSpawned {
        wave: u32,
        operation: Operation,
        target: u32,
    },
    SelectionChanged {
        selected: usize,
    },
    Matched {
        blocks: usize,
        gained: u64,
        score: u64,
    },
    GameOver {
        score: u64,
        wave: u32,
    },
}

/// Complete session state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    rng: Pcg32,
    pub phase: GamePhase,
    pub score: u64,
    /// Number of waves spawned so far (1-based once playing)
    pub wave_index: u32,
    /// Gravity ticks applied
    pub time_ticks: u64,
    /// Operation of the live wave
    pub operation: Operation,
    /// Target of the live wave
    pub target: u32,
    /// Blocks of the live wave (empty between waves)
    pub blocks: Vec<Block>,
    /// Tapped block ids in tap order
    pub selection: Vec<BlockId>,
    /// Pending events for the presentation layer
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle session with the given seed
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::NotStarted,
            score: 0,
            wave_index: 0,
            time_ticks: 0,
            operation: Operation::Add,
            target: 0,
            blocks: Vec::new(),
            selection: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Draw the seed for the session that replaces this one
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random()
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|b| &b.id == id)
    }

    /// Values of the selected blocks, in tap order
    pub fn selected_values(&self) -> Vec<u32> {
        self.selection
            .iter()
            .filter_map(|id| self.block(id).map(|b| b.value))
            .collect()
    }

    /// Move into `GameOver`, destroying the live wave. Returns `true` only for
    /// the first transition.
    pub fn enter_game_over(&mut self) -> bool {
        if self.phase == GamePhase::GameOver || self.phase == GamePhase::NotStarted {
            return false;
        }
        self.phase = GamePhase::GameOver;
        self.blocks.clear();
        self.selection.clear();
        self.events.push(GameEvent::GameOver {
            score: self.score,
            wave: self.wave_index,
        });
        true
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_str(op.as_str()), Some(op));
        }
        assert_eq!(
            Operation::from_str(" Multiplication "),
            Some(Operation::Multiply)
        );
        assert_eq!(Operation::from_str("modulo"), None);
    }

    #[test]
    fn test_block_ids_are_unique_per_wave_and_lane() {
        let a = BlockId::new(1, 0xdead_beef, 0);
        let b = BlockId::new(2, 0xdead_beef, 0);
        let c = BlockId::new(1, 0xdead_beef, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "w1-deadbeef-0");
    }

    #[test]
    fn test_game_over_transition_is_latched() {
        let mut state = GameState::new(7);
        // Nothing to end before the game starts
        assert!(!state.enter_game_over());

        state.phase = GamePhase::Playing;
        state.blocks.push(Block {
            id: BlockId::new(1, 7, 0),
            value: 4,
            lane: 0,
            y: 0.0,
            color: BlockColor::Red,
        });
        state.selection.push(BlockId::new(1, 7, 0));
        assert!(state.enter_game_over());
        assert!(!state.enter_game_over());
        assert!(state.is_game_over());
        assert!(state.blocks.is_empty());
        assert!(state.selection.is_empty());

        let game_overs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }
}
