//! Question provider
//!
//! Every wave is built from one [`Question`]: an operation, one operand per
//! lane and a target that at least one valid selection reaches. Questions are
//! taken from a bank of records when one is available and generated otherwise.
//!
//! Fallback policy: a bank record that cannot become a valid question is
//! logged and replaced by a generated one, so [`QuestionProvider::next`]
//! never fails.

use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::Operation;
use crate::consts::{LANE_COUNT, MAX_OPERAND, MIN_OPERAND};
use crate::settings::GameMode;

/// Why a question record could not be turned into a [`Question`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
    #[error("question has no target")]
    MissingTarget,
    #[error("target {0} is not a positive integer")]
    InvalidTarget(i64),
    #[error("{0} operands do not fit in {lanes} lanes", lanes = LANE_COUNT)]
    TooManyOperands(usize),
    #[error("target {target} is unreachable by {operation} over {operands:?}")]
    Unreachable {
        operation: Operation,
        target: u32,
        operands: [u32; LANE_COUNT],
    },
}

/// Raw question data as stored in a bank or returned by a generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub operation: String,
    /// One entry per lane; missing or non-positive entries are back-filled
    #[serde(default)]
    pub operands: Vec<Option<i64>>,
    #[serde(default)]
    pub target: Option<i64>,
}

impl QuestionRecord {
    pub fn new(operation: Operation, operands: &[i64], target: i64) -> Self {
        Self {
            operation: operation.as_str().to_string(),
            operands: operands.iter().copied().map(Some).collect(),
            target: Some(target),
        }
    }
}

impl From<&Question> for QuestionRecord {
    fn from(question: &Question) -> Self {
        let operands: Vec<i64> = question.operands.iter().map(|&v| i64::from(v)).collect();
        Self::new(question.operation, &operands, i64::from(question.target))
    }
}

/// A validated, immutable wave question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    operation: Operation,
    operands: [u32; LANE_COUNT],
    target: u32,
}

impl Question {
    /// Build a question, checking that the target is reachable
    pub fn new(
        operation: Operation,
        operands: [u32; LANE_COUNT],
        target: u32,
    ) -> Result<Self, DataError> {
        if target == 0 {
            return Err(DataError::InvalidTarget(0));
        }
        if solve(operation, &operands, target).is_none() {
            return Err(DataError::Unreachable {
                operation,
                target,
                operands,
            });
        }
        Ok(Self {
            operation,
            operands,
            target,
        })
    }

    /// Convert a bank record, back-filling missing lanes with random digits
    pub fn from_record<R: Rng + ?Sized>(
        record: &QuestionRecord,
        rng: &mut R,
    ) -> Result<Self, DataError> {
        let operation = Operation::from_str(&record.operation)
            .ok_or_else(|| DataError::UnknownOperation(record.operation.clone()))?;
        let raw_target = record.target.ok_or(DataError::MissingTarget)?;
        let target = u32::try_from(raw_target)
            .ok()
            .filter(|t| *t > 0)
            .ok_or(DataError::InvalidTarget(raw_target))?;
        if record.operands.len() > LANE_COUNT {
            return Err(DataError::TooManyOperands(record.operands.len()));
        }

        let mut operands = [0u32; LANE_COUNT];
        let mut filled = 0;
        for (lane, slot) in operands.iter_mut().enumerate() {
            let given = record
                .operands
                .get(lane)
                .copied()
                .flatten()
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0);
            *slot = match given {
                Some(v) => v,
                None => {
                    filled += 1;
                    random_operand(rng)
                }
            };
        }
        if filled > 0 {
            log::debug!("Back-filled {filled} lanes of a {operation} question");
        }

        Self::new(operation, operands, target)
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn operands(&self) -> &[u32; LANE_COUNT] {
        &self.operands
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    /// Lanes of one winning selection
    pub fn solution(&self) -> Option<Vec<usize>> {
        solve(self.operation, &self.operands, self.target)
    }
}

/// Random operand in the single-digit range
pub fn random_operand<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(MIN_OPERAND..=MAX_OPERAND)
}

/// Find lane indices whose values reach `target` under `operation`
///
/// Selections follow the tap rules: 1-3 lanes for add, exactly 2 for
/// subtract/multiply/divide and exactly 1 for square.
pub fn solve(operation: Operation, values: &[u32], target: u32) -> Option<Vec<usize>> {
    let max = operation.max_selection().min(values.len());
    (operation.min_selection()..=max)
        .flat_map(|size| combinations(values.len(), size))
        .find(|lanes| {
            let picked: Vec<u32> = lanes.iter().map(|&i| values[i]).collect();
            operation.is_match(&picked, target)
        })
}

/// All ascending index combinations of `size` out of `n`
fn combinations(n: usize, size: usize) -> Vec<Vec<usize>> {
    fn extend(
        start: usize,
        n: usize,
        size: usize,
        current: &mut Vec<usize>,
        out: &mut Vec<Vec<usize>>,
    ) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            extend(i + 1, n, size, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    if size > 0 && size <= n {
        extend(0, n, size, &mut Vec::with_capacity(size), &mut out);
    }
    out
}

/// Generate a question that is solvable by construction
pub fn generate<R: Rng + ?Sized>(operation: Operation, rng: &mut R) -> Question {
    let mut operands = [0u32; LANE_COUNT];
    for slot in &mut operands {
        *slot = random_operand(rng);
    }

    // Lanes that carry the planted solution
    let mut lanes: Vec<usize> = (0..LANE_COUNT).collect();
    lanes.shuffle(rng);
    let (a, b) = (lanes[0], lanes[1]);

    let target = match operation {
        Operation::Add => {
            let terms = rng.random_range(2..=3);
            lanes[..terms].iter().map(|&lane| operands[lane]).sum()
        }
        Operation::Subtract => {
            while operands[a] == operands[b] {
                operands[b] = random_operand(rng);
            }
            operands[a].abs_diff(operands[b])
        }
        Operation::Multiply => operands[a] * operands[b],
        Operation::Divide => {
            let divisor = rng.random_range(2..=MAX_OPERAND);
            let quotient = rng.random_range(2..=MAX_OPERAND);
            operands[a] = divisor;
            operands[b] = divisor * quotient;
            quotient
        }
        Operation::Square => {
            let base = rng.random_range(2..=12);
            operands[a] = base;
            base * base
        }
    };

    debug_assert!(solve(operation, &operands, target).is_some());
    Question {
        operation,
        operands,
        target,
    }
}

/// Bundled questions used when nothing better is available
pub fn static_bank() -> Vec<QuestionRecord> {
    vec![
        QuestionRecord::new(Operation::Add, &[3, 7, 2, 9, 1], 10),
        QuestionRecord::new(Operation::Add, &[5, 8, 4, 6, 1], 15),
        QuestionRecord {
            operation: "add".to_string(),
            operands: vec![Some(2), Some(6), None, Some(4)],
            target: Some(12),
        },
        QuestionRecord::new(Operation::Subtract, &[8, 3, 5, 1, 6], 5),
        QuestionRecord::new(Operation::Subtract, &[9, 2, 6, 4, 7], 7),
        QuestionRecord::new(Operation::Multiply, &[4, 6, 2, 7, 3], 24),
        QuestionRecord::new(Operation::Multiply, &[9, 2, 5, 3, 8], 45),
        QuestionRecord::new(Operation::Divide, &[9, 3, 4, 8, 5], 3),
        QuestionRecord::new(Operation::Divide, &[8, 2, 7, 6, 5], 4),
        QuestionRecord::new(Operation::Square, &[4, 2, 7, 5, 3], 16),
        QuestionRecord::new(Operation::Square, &[6, 9, 2, 8, 3], 81),
    ]
}

/// Supplies one question per wave for a game mode
#[derive(Debug, Clone)]
pub struct QuestionProvider {
    mode: GameMode,
    bank: VecDeque<QuestionRecord>,
}

impl QuestionProvider {
    /// Provider that only generates
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            bank: VecDeque::new(),
        }
    }

    /// Provider that drains `records` (in order) before generating
    pub fn with_bank(mode: GameMode, records: impl IntoIterator<Item = QuestionRecord>) -> Self {
        let bank = records
            .into_iter()
            .filter(|r| mode.accepts(&r.operation))
            .collect();
        Self { mode, bank }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Bank records not yet consumed
    pub fn remaining(&self) -> usize {
        self.bank.len()
    }

    /// Next question. Never fails: see the module docs for the fallback.
    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Question {
        if let Some(record) = self.bank.pop_front() {
            match Question::from_record(&record, rng) {
                Ok(question) => return question,
                Err(err) => log::warn!("Discarding bank question ({err}); generating one instead"),
            }
        }
        let operation = self.mode.pick_operation(rng);
        generate(operation, rng)
    }
}
