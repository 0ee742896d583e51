//! Set and match scoring rules.
//!
//! A set counts only when the higher score reaches 11 with a margin of at
//! least two points (deuce extends the set). A match is decided once one side
//! holds three counted sets. Sets that do not satisfy the rule are ignored,
//! never rejected, so a partially entered scoresheet simply has no winner yet.

use serde_json::Value;
use thiserror::Error;

use crate::models::{RawSetScore, SetScore, Slot, SETS_PER_MATCH};

pub const MIN_WINNING_POINTS: u32 = 11;
pub const MIN_MARGIN: u32 = 2;
pub const SETS_TO_WIN: u32 = 3;
pub const MAX_SET_POINTS: i64 = 50;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScoreError {
    #[error("exactly {expected} sets required, got {actual}")]
    WrongSetCount { expected: usize, actual: usize },

    #[error("set {set}: scores must be integers")]
    NotAnInteger { set: usize },

    #[error("set {set}: score {value} outside 0..={max}")]
    OutOfRange { set: usize, value: i64, max: i64 },
}

impl SetScore {
    /// Whether this set satisfies the 11-points, 2-clear rule.
    pub fn is_valid(&self) -> bool {
        self.p1.max(self.p2) >= MIN_WINNING_POINTS && self.p1.abs_diff(self.p2) >= MIN_MARGIN
    }

    /// Side credited with this set, if it counts at all.
    pub fn taken_by(&self) -> Option<Slot> {
        if !self.is_valid() {
            return None;
        }
        if self.p1 > self.p2 {
            Some(Slot::P1)
        } else {
            Some(Slot::P2)
        }
    }
}

/// Counted set wins as `(p1, p2)`.
pub fn valid_set_wins(sets: &[SetScore]) -> (u32, u32) {
    sets.iter().fold((0, 0), |(w1, w2), set| match set.taken_by() {
        Some(Slot::P1) => (w1 + 1, w2),
        Some(Slot::P2) => (w1, w2 + 1),
        None => (w1, w2),
    })
}

/// Decide a best-of-five. `None` means no side has three counted sets yet.
pub fn evaluate(sets: &[SetScore; SETS_PER_MATCH]) -> Option<Slot> {
    let (w1, w2) = valid_set_wins(sets);
    if w1 >= SETS_TO_WIN {
        Some(Slot::P1)
    } else if w2 >= SETS_TO_WIN {
        Some(Slot::P2)
    } else {
        None
    }
}

/// Validate caller-supplied sets and convert them to stored scores.
pub fn normalize_sets(raw: &[RawSetScore]) -> Result<[SetScore; SETS_PER_MATCH], ScoreError> {
    if raw.len() != SETS_PER_MATCH {
        return Err(ScoreError::WrongSetCount {
            expected: SETS_PER_MATCH,
            actual: raw.len(),
        });
    }

    let mut sets = [SetScore::default(); SETS_PER_MATCH];
    for (i, (slot, input)) in sets.iter_mut().zip(raw).enumerate() {
        let set = i + 1;
        *slot = SetScore::new(parse_score(&input.p1, set)?, parse_score(&input.p2, set)?);
    }
    Ok(sets)
}

fn parse_score(value: &Value, set: usize) -> Result<u32, ScoreError> {
    let parsed = match value {
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(v), _) => v,
            (None, Some(_)) => i64::MAX,
            (None, None) => return Err(ScoreError::NotAnInteger { set }),
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ScoreError::NotAnInteger { set })?,
        _ => return Err(ScoreError::NotAnInteger { set }),
    };

    if !(0..=MAX_SET_POINTS).contains(&parsed) {
        return Err(ScoreError::OutOfRange {
            set,
            value: parsed,
            max: MAX_SET_POINTS,
        });
    }
    u32::try_from(parsed).map_err(|_| ScoreError::OutOfRange {
        set,
        value: parsed,
        max: MAX_SET_POINTS,
    })
}
