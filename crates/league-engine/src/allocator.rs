//! Room allocation - the interactive join flow.
//!
//! `join` admits a user into exactly one room per week:
//!
//! 1. An existing (user, week) membership short-circuits as an
//!    idempotent re-join.
//! 2. The user's tier comes from the Identity port; an unknown or
//!    missing tier falls back to the lowest catalog tier.
//! 3. Among the week+tier's open rooms with free capacity, the least
//!    populated wins (fill-smallest bin packing keeps rooms balanced
//!    instead of topping off one room).
//! 4. No candidate: a fresh room is opened with the civil week bounds,
//!    unless the tier-week is already finalized.
//!
//! The check-then-admit sequence is not atomic on its own; the shared
//! [`RoomLock`] serializes it - against other joiners, so two can never
//! both take the last slot, and against the finalizer, so a join can
//! never write back a stale `Unprocessed` copy of a room that was just
//! committed as processed.

use crate::error::{Error, JoinError};
use crate::ports::{Clock, Identity};
use crate::storage::{RoomLock, Storage};
use league_core::{Membership, Room, TierCatalog, TierDefinition, WeekId};
use std::sync::Arc;

/// Successful join: where the user ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room_id: String,
    pub tier: String,
    /// True when the user was already in a room this week and the call
    /// changed nothing.
    pub already_member: bool,
}

/// Finds-or-creates a room for a (week, tier) and admits users into it
/// exactly once per week.
pub struct RoomAllocator {
    storage: Arc<Storage>,
    identity: Arc<dyn Identity>,
    clock: Arc<dyn Clock>,
    catalog: TierCatalog,
    /// Guards the check-then-admit critical section; the same lock is
    /// held by the finalizer's per-room commits.
    lock: RoomLock,
}

impl RoomAllocator {
    pub fn new(
        storage: Arc<Storage>,
        identity: Arc<dyn Identity>,
        clock: Arc<dyn Clock>,
        catalog: TierCatalog,
        lock: RoomLock,
    ) -> Self {
        Self {
            storage,
            identity,
            clock,
            catalog,
            lock,
        }
    }

    /// Admit a user into this week's room for their tier.
    pub fn join(&self, user_id: &str, week: WeekId) -> std::result::Result<JoinOutcome, JoinError> {
        // Fast path outside the lock: re-join is read-only.
        if let Some(outcome) = self.existing_membership(user_id, week)? {
            return Ok(outcome);
        }

        let tier = self.resolve_tier(user_id)?.clone();

        let _rooms = self.lock.acquire();

        // Re-check under the lock: the same user may have raced us.
        if let Some(outcome) = self.existing_membership(user_id, week)? {
            return Ok(outcome);
        }

        let rooms = self
            .storage
            .rooms_for(week, &tier.name)
            .map_err(storage_failed)?;

        let candidate = rooms
            .iter()
            .filter(|r| r.has_capacity(tier.max_room_size))
            .min_by(|a, b| a.population.cmp(&b.population).then(a.id.cmp(&b.id)));

        match candidate {
            Some(room) => self.admit_into(room.clone(), &tier, user_id, week),
            None if rooms.iter().any(|r| r.is_processed()) => {
                // Finalize already ran here; opening a fresh room now
                // would let the user dodge the outcome that was just
                // applied.
                Err(JoinError::WeekClosed {
                    tier: tier.name.clone(),
                    week: week.to_string(),
                })
            }
            None => self.open_room(&tier, user_id, week),
        }
    }

    /// Look up the (user, week) membership and turn it into a re-join
    /// outcome.
    fn existing_membership(
        &self,
        user_id: &str,
        week: WeekId,
    ) -> std::result::Result<Option<JoinOutcome>, JoinError> {
        let Some(member) = self
            .storage
            .membership(week, user_id)
            .map_err(storage_failed)?
        else {
            return Ok(None);
        };
        let room = self
            .storage
            .room(&member.room_id)
            .map_err(storage_failed)?
            .ok_or_else(|| {
                JoinError::StorageFailed(format!(
                    "membership of {user_id} points at missing room {}",
                    member.room_id
                ))
            })?;
        tracing::debug!(user = %user_id, room = %room.id, "idempotent re-join");
        Ok(Some(JoinOutcome {
            room_id: room.id,
            tier: room.tier,
            already_member: true,
        }))
    }

    /// The user's catalog tier, falling back to the lowest tier when
    /// the Identity record names no tier or one the catalog lacks.
    fn resolve_tier(&self, user_id: &str) -> std::result::Result<&TierDefinition, JoinError> {
        let user = self
            .identity
            .user(user_id)
            .map_err(|e| JoinError::IdentityUnavailable {
                user_id: user_id.to_string(),
                reason: e.to_string(),
            })?;
        match user.tier.as_deref().and_then(|name| self.catalog.get(name)) {
            Some(tier) => Ok(tier),
            None => {
                let lowest = self.catalog.lowest();
                tracing::warn!(
                    user = %user_id,
                    recorded = user.tier.as_deref().unwrap_or("<none>"),
                    fallback = %lowest.name,
                    "unknown tier, defaulting to lowest"
                );
                Ok(lowest)
            }
        }
    }

    /// Admit into an existing room: capacity-checked increment plus
    /// membership, one batch.
    fn admit_into(
        &self,
        mut room: Room,
        tier: &TierDefinition,
        user_id: &str,
        week: WeekId,
    ) -> std::result::Result<JoinOutcome, JoinError> {
        if !room.admit(tier.max_room_size) {
            return Err(JoinError::RoomFull {
                tier: tier.name.clone(),
                week: week.to_string(),
            });
        }
        let member = Membership::new(&room.id, week, user_id, self.clock.now_millis());
        self.storage
            .insert_member(&room, &member)
            .map_err(storage_failed)?;
        tracing::info!(user = %user_id, room = %room.id, tier = %tier.name, "joined room");
        Ok(JoinOutcome {
            room_id: room.id,
            tier: tier.name.clone(),
            already_member: false,
        })
    }

    /// Lazily open a new room for (week, tier) and admit the user as
    /// its founding member, all one batch.
    fn open_room(
        &self,
        tier: &TierDefinition,
        user_id: &str,
        week: WeekId,
    ) -> std::result::Result<JoinOutcome, JoinError> {
        let now = self.clock.now_millis();
        let starts_at = self.clock.civil_to_millis(week.start());
        let ends_at = self.clock.civil_to_millis(week.end());
        let id = room_id(week, &tier.name, user_id, now);
        let mut room =
            Room::new(id, week, &tier.name, starts_at, ends_at).map_err(|e| {
                JoinError::StorageFailed(format!("cannot build room window: {e}"))
            })?;
        if !room.admit(tier.max_room_size) {
            // max_room_size >= 1 by tier validation; unreachable.
            return Err(JoinError::RoomFull {
                tier: tier.name.clone(),
                week: week.to_string(),
            });
        }
        let member = Membership::new(&room.id, week, user_id, now);
        self.storage
            .create_room_with_member(&room, &member)
            .map_err(storage_failed)?;
        tracing::info!(room = %room.id, tier = %tier.name, week = %week, "opened new room");
        Ok(JoinOutcome {
            room_id: room.id,
            tier: tier.name.clone(),
            already_member: false,
        })
    }
}

/// Deterministic-enough unique room id: hash of the creating context.
fn room_id(week: WeekId, tier: &str, user_id: &str, now: i64) -> String {
    let seed = format!("{week}:{tier}:{user_id}:{now}");
    hex::encode(blake3::hash(seed.as_bytes()).as_bytes())
}

fn storage_failed(e: Error) -> JoinError {
    JoinError::StorageFailed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FixedClock, StubIdentity};
    use tempfile::TempDir;

    fn week() -> WeekId {
        "2025-W03".parse().unwrap()
    }

    fn catalog() -> TierCatalog {
        TierCatalog::new(vec![
            TierDefinition::new("ISINMA", 1, 20, 0, 2, 3).unwrap(),
            TierDefinition::new("SILVER", 2, 15, 15, 2, 3).unwrap(),
        ])
        .unwrap()
    }

    fn setup() -> (TempDir, Arc<Storage>, Arc<StubIdentity>, RoomAllocator) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(dir.path()).unwrap());
        let identity = Arc::new(StubIdentity::new());
        let clock = Arc::new(FixedClock::at(1_000));
        let allocator = RoomAllocator::new(
            storage.clone(),
            identity.clone(),
            clock,
            catalog(),
            RoomLock::new(),
        );
        (dir, storage, identity, allocator)
    }

    #[test]
    fn first_join_opens_a_room() {
        let (_dir, storage, identity, allocator) = setup();
        identity.insert("u1", Some("SILVER"), 0);

        let outcome = allocator.join("u1", week()).unwrap();
        assert_eq!(outcome.tier, "SILVER");
        assert!(!outcome.already_member);

        let room = storage.room(&outcome.room_id).unwrap().unwrap();
        assert_eq!(room.population, 1);
        assert!(room.ends_at > room.starts_at);
        assert_eq!(storage.roster(&room.id).unwrap().len(), 1);
    }

    #[test]
    fn rejoin_is_idempotent() {
        let (_dir, storage, identity, allocator) = setup();
        identity.insert("u1", Some("ISINMA"), 0);

        let first = allocator.join("u1", week()).unwrap();
        let second = allocator.join("u1", week()).unwrap();
        assert_eq!(first.room_id, second.room_id);
        assert!(second.already_member);
        assert_eq!(storage.room(&first.room_id).unwrap().unwrap().population, 1);
    }

    #[test]
    fn unknown_tier_falls_back_to_lowest() {
        let (_dir, _storage, identity, allocator) = setup();
        identity.insert("u1", Some("DIAMOND"), 0);
        identity.insert("u2", None, 0);

        assert_eq!(allocator.join("u1", week()).unwrap().tier, "ISINMA");
        assert_eq!(allocator.join("u2", week()).unwrap().tier, "ISINMA");
    }

    #[test]
    fn fills_smallest_room_first() {
        let (_dir, storage, identity, allocator) = setup();
        for u in ["u1", "u2", "u3", "u4"] {
            identity.insert(u, Some("ISINMA"), 0);
            allocator.join(u, week()).unwrap();
        }
        // Cap is 3: u1-u3 fill the first room, u4 opens a second.
        let rooms = storage.rooms_for(week(), "ISINMA").unwrap();
        assert_eq!(rooms.len(), 2);

        // u5 lands in the emptier second room.
        identity.insert("u5", Some("ISINMA"), 0);
        let outcome = allocator.join("u5", week()).unwrap();
        let room = storage.room(&outcome.room_id).unwrap().unwrap();
        assert_eq!(room.population, 2);
    }

    #[test]
    fn processed_week_rejects_new_joins() {
        let (_dir, storage, identity, allocator) = setup();
        identity.insert("u1", Some("ISINMA"), 0);
        let outcome = allocator.join("u1", week()).unwrap();

        let mut room = storage.room(&outcome.room_id).unwrap().unwrap();
        assert!(room.mark_processed(2_000));
        storage.commit_finalized_room(&room, &[], &[]).unwrap();

        identity.insert("u2", Some("ISINMA"), 0);
        let err = allocator.join("u2", week()).unwrap_err();
        assert_eq!(err.code(), "WEEK_CLOSED");

        // The member of the processed room still re-joins fine.
        assert!(allocator.join("u1", week()).unwrap().already_member);
    }

    #[test]
    fn identity_outage_is_a_tagged_rejection() {
        let (_dir, _storage, identity, allocator) = setup();
        identity.fail_lookups(true);
        let err = allocator.join("u1", week()).unwrap_err();
        assert_eq!(err.code(), "IDENTITY_UNAVAILABLE");
    }

    #[test]
    fn capacity_holds_under_concurrent_joins() {
        let (_dir, storage, identity, allocator) = setup();
        let allocator = Arc::new(allocator);
        let users: Vec<String> = (0..16).map(|i| format!("u{i}")).collect();
        for u in &users {
            identity.insert(u, Some("ISINMA"), 0);
        }

        let handles: Vec<_> = users
            .iter()
            .map(|u| {
                let allocator = allocator.clone();
                let u = u.clone();
                std::thread::spawn(move || allocator.join(&u, "2025-W03".parse().unwrap()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let rooms = storage.rooms_for(week(), "ISINMA").unwrap();
        let total: u32 = rooms.iter().map(|r| r.population).sum();
        assert_eq!(total, 16);
        for room in rooms {
            assert!(room.population <= 3, "room {} over cap", room.id);
            assert_eq!(
                room.population as usize,
                storage.roster(&room.id).unwrap().len()
            );
        }
    }
}
