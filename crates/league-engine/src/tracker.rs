//! Live membership queries: ranks, rosters, point recording.

use crate::error::{Error, Result};
use crate::storage::Storage;
use league_core::{shared_rank, sort_canonical, Membership, WeekId};
use serde::Serialize;
use std::sync::Arc;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMember {
    pub user_id: String,
    pub points: u64,
    /// Shared rank: ties hold the same number.
    pub rank: u32,
}

/// A user's current room, seen from their side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub tier: String,
    pub week: WeekId,
    pub population: u32,
    pub my_points: u64,
    pub my_rank: u32,
}

/// Read-side of room state plus the narrow write the points-accrual
/// collaborator goes through.
pub struct MembershipTracker {
    storage: Arc<Storage>,
}

impl MembershipTracker {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Live shared rank a member with `points` holds in the room.
    pub fn rank_of(&self, room_id: &str, points: u64) -> Result<u32> {
        let roster = self.storage.roster(room_id)?;
        Ok(shared_rank(points, &roster))
    }

    /// The canonical ordering: points descending, earlier join first.
    /// Finalize walks exactly this order.
    pub fn roster_ordered(&self, room_id: &str) -> Result<Vec<Membership>> {
        let mut roster = self.storage.roster(room_id)?;
        sort_canonical(&mut roster);
        Ok(roster)
    }

    /// Leaderboard view: canonical order with shared ranks.
    pub fn leaderboard(&self, room_id: &str) -> Result<Vec<RankedMember>> {
        let roster = self.roster_ordered(room_id)?;
        Ok(roster
            .iter()
            .map(|m| RankedMember {
                user_id: m.user_id.clone(),
                points: m.points,
                rank: shared_rank(m.points, &roster),
            })
            .collect())
    }

    /// Member count of a room.
    pub fn count(&self, room_id: &str) -> Result<usize> {
        Ok(self.storage.roster(room_id)?.len())
    }

    /// The room a user is competing in this week, if any.
    pub fn my_room(&self, user_id: &str, week: WeekId) -> Result<Option<RoomSummary>> {
        let Some(member) = self.storage.membership(week, user_id)? else {
            return Ok(None);
        };
        let room = self.storage.room(&member.room_id)?.ok_or_else(|| {
            Error::Storage(format!(
                "membership of {user_id} points at missing room {}",
                member.room_id
            ))
        })?;
        let rank = self.rank_of(&room.id, member.points)?;
        Ok(Some(RoomSummary {
            room_id: room.id,
            tier: room.tier,
            week,
            population: room.population,
            my_points: member.points,
            my_rank: rank,
        }))
    }

    /// Record a user's points-in-room for the week. The value comes
    /// from the external points-accrual collaborator; this core never
    /// computes it.
    pub fn record_points(&self, user_id: &str, week: WeekId, points: u64) -> Result<()> {
        let Some(mut member) = self.storage.membership(week, user_id)? else {
            return Err(Error::NotFound(format!(
                "no membership for {user_id} in {week}"
            )));
        };
        member.points = points;
        self.storage.update_member(&member)
    }
}
