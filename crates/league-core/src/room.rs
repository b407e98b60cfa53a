//! Rooms - capacity-bounded weekly competition groups.

use crate::error::DomainError;
use crate::week::WeekId;
use serde::{Deserialize, Serialize};

/// Processing state of a room.
///
/// A single one-way transition: `Unprocessed -> Processed`. Once
/// processed, a room accepts no new members and is skipped by any
/// further finalize run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomState {
    /// Live: accepting joins, awaiting finalize.
    Unprocessed,
    /// Finalized at the given unix-millis timestamp. Terminal.
    Processed { at: i64 },
}

/// A capacity-bounded group of users competing within one tier for one
/// week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique identifier.
    pub id: String,

    /// Competition period.
    pub week: WeekId,

    /// Tier name (resolved against the catalog when needed).
    pub tier: String,

    /// Live member count. Always equals the roster size; both are
    /// written in the same storage batch.
    pub population: u32,

    /// Week window start, unix millis.
    pub starts_at: i64,

    /// Week window end, unix millis. Always after `starts_at`.
    pub ends_at: i64,

    /// One-way processing state.
    pub state: RoomState,
}

impl Room {
    /// Create an empty, unprocessed room.
    ///
    /// Rejects a window that does not end after it starts.
    pub fn new(
        id: impl Into<String>,
        week: WeekId,
        tier: impl Into<String>,
        starts_at: i64,
        ends_at: i64,
    ) -> Result<Self, DomainError> {
        if ends_at <= starts_at {
            return Err(DomainError::InvalidWindow {
                start: starts_at,
                end: ends_at,
            });
        }
        Ok(Self {
            id: id.into(),
            week,
            tier: tier.into(),
            population: 0,
            starts_at,
            ends_at,
            state: RoomState::Unprocessed,
        })
    }

    /// Whether finalize has already run on this room.
    pub fn is_processed(&self) -> bool {
        matches!(self.state, RoomState::Processed { .. })
    }

    /// Whether a new member fits under the tier's cap.
    pub fn has_capacity(&self, max_room_size: u32) -> bool {
        !self.is_processed() && self.population < max_room_size
    }

    /// Admit one member: capacity-checked increment.
    ///
    /// Returns false (and leaves the room untouched) when the room is
    /// processed or already at the cap. The caller persists the room
    /// and the membership in one batch.
    pub fn admit(&mut self, max_room_size: u32) -> bool {
        if !self.has_capacity(max_room_size) {
            return false;
        }
        self.population += 1;
        true
    }

    /// Transition to `Processed`.
    ///
    /// Returns true when the transition happened, false as a no-op when
    /// the room was already processed. Never an error: this is what
    /// makes finalize safe to re-run.
    pub fn mark_processed(&mut self, at: i64) -> bool {
        match self.state {
            RoomState::Processed { .. } => false,
            RoomState::Unprocessed => {
                self.state = RoomState::Processed { at };
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new("r1", "2025-W03".parse().unwrap(), "ISINMA", 0, 1000).unwrap()
    }

    #[test]
    fn rejects_inverted_window() {
        let week = "2025-W03".parse().unwrap();
        assert!(matches!(
            Room::new("r1", week, "ISINMA", 1000, 1000),
            Err(DomainError::InvalidWindow { .. })
        ));
    }

    #[test]
    fn admit_increments_until_cap() {
        let mut room = room();
        assert!(room.admit(2));
        assert!(room.admit(2));
        assert!(!room.admit(2));
        assert_eq!(room.population, 2);
    }

    #[test]
    fn processed_room_rejects_admits() {
        let mut room = room();
        assert!(room.mark_processed(42));
        assert!(!room.admit(20));
        assert_eq!(room.population, 0);
    }

    #[test]
    fn mark_processed_is_one_way() {
        let mut room = room();
        assert!(room.mark_processed(42));
        assert!(!room.mark_processed(99));
        assert_eq!(room.state, RoomState::Processed { at: 42 });
    }
}
