//! Promotion/demotion cutoffs and the finalize ledger types.
//!
//! For a room of `n` members:
//! - `promote_count = ceil(n * promote% / 100)` from the top
//! - `demote_count = floor(n * demote% / 100)` from the bottom
//!
//! Walking the canonical order with positional ranks `1..=n`, a member
//! is promoted when `rank <= promote_count` and a next tier exists,
//! demoted when `rank > n - demote_count` and a previous tier exists,
//! otherwise retained.

use crate::week::WeekId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Period type tag persisted on every history record.
pub const PERIOD_WEEKLY: &str = "WEEKLY";

/// What finalize decided for one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Promoted,
    Demoted,
    Stayed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Promoted => "PROMOTED",
            Outcome::Demoted => "DEMOTED",
            Outcome::Stayed => "STAYED",
        };
        f.write_str(s)
    }
}

/// One row of the append-only league ledger.
///
/// Written exactly once per (user, week) during finalize; never mutated
/// or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// User the row belongs to.
    pub user_id: String,

    /// Always [`PERIOD_WEEKLY`]; kept on the row so the persisted
    /// shape stays queryable across period-type additions.
    pub period_type: String,

    /// The week the row archives.
    pub period_id: WeekId,

    /// Points at finalize time.
    pub points: u64,

    /// Positional rank assigned by the finalize walk.
    pub rank: u32,

    /// Tier the user competed in (before any promotion/demotion).
    pub tier: String,

    /// Decision for this member.
    pub outcome: Outcome,
}

/// Number of members promoted out of a room of `n`: `ceil(n * p / 100)`.
pub const fn promote_count(n: usize, promote_percent: u8) -> usize {
    (n * promote_percent as usize + 99) / 100
}

/// Number of members demoted out of a room of `n`: `floor(n * d / 100)`.
pub const fn demote_count(n: usize, demote_percent: u8) -> usize {
    n * demote_percent as usize / 100
}

/// Decide one member's outcome from their positional rank.
///
/// `has_next`/`has_prev` say whether a tier exists above/below; at the
/// catalog extremes a cutoff hit degrades to `Stayed`.
pub fn classify(
    rank: usize,
    total: usize,
    promote_count: usize,
    demote_count: usize,
    has_next: bool,
    has_prev: bool,
) -> Outcome {
    if rank <= promote_count && has_next {
        Outcome::Promoted
    } else if rank > total - demote_count && has_prev {
        Outcome::Demoted
    } else {
        Outcome::Stayed
    }
}
