//! Memberships and the ranking rules.

use crate::week::WeekId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A user's seat in a room for one week.
///
/// At most one exists per (user, week). `points` is written by the
/// external points-accrual collaborator throughout the week;
/// `rank_snapshot` is set exactly once, at finalize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    /// Room this membership belongs to.
    pub room_id: String,

    /// Competition period (the uniqueness key together with `user_id`).
    pub week: WeekId,

    /// User identifier (opaque; the user itself is owned by the
    /// Identity collaborator).
    pub user_id: String,

    /// Points accumulated in this room so far.
    pub points: u64,

    /// Positional rank assigned at finalize, absent before that.
    pub rank_snapshot: Option<u32>,

    /// Join time, unix millis. Earlier joiners win ties.
    pub joined_at: i64,
}

impl Membership {
    /// Create a fresh membership with zero points.
    pub fn new(
        room_id: impl Into<String>,
        week: WeekId,
        user_id: impl Into<String>,
        joined_at: i64,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            week,
            user_id: user_id.into(),
            points: 0,
            rank_snapshot: None,
            joined_at,
        }
    }
}

/// Canonical room ordering: points descending, then join time
/// ascending, then user id ascending.
///
/// The user-id leg makes the order total, so storage iteration order
/// can never leak into promotion outcomes. This ordering drives both
/// leaderboards and the finalize walk.
pub fn canonical_order(a: &Membership, b: &Membership) -> Ordering {
    b.points
        .cmp(&a.points)
        .then(a.joined_at.cmp(&b.joined_at))
        .then(a.user_id.cmp(&b.user_id))
}

/// Sort a roster into canonical order.
pub fn sort_canonical(roster: &mut [Membership]) {
    roster.sort_by(canonical_order);
}

/// Live shared rank: 1 + members strictly ahead on points.
///
/// Ties share the same rank number (two members on equal points both
/// see the same rank). Reproduced exactly for compatibility; note this
/// can differ from the positional rank finalize assigns when ties are
/// present.
pub fn shared_rank(points: u64, roster: &[Membership]) -> u32 {
    roster.iter().filter(|m| m.points > points).count() as u32 + 1
}
