//! The weekly finalize batch.
//!
//! For every unprocessed room of the target week: rank the members in
//! canonical order, apply the tier's promotion/demotion cutoffs, write
//! the user's new tier through the Identity port, append one history
//! row per member, and mark the room processed. Each room's mutations
//! commit as one storage batch.
//!
//! Failure isolation: an error inside one room is logged with the room
//! id, counted, and the batch moves on. Re-invocation is safe - the
//! processed flag keeps finished rooms out of the scan.

use crate::error::{Error, Result};
use crate::ports::{Clock, Identity, Notifier};
use crate::storage::{RoomLock, Storage};
use crate::tracker::MembershipTracker;
use league_core::{
    classify, demote_count, promote_count, HistoryRecord, Outcome, Room, TierCatalog,
    WeekId, PERIOD_WEEKLY,
};
use serde::Serialize;
use std::sync::Arc;

/// What a finalize run did, reported to the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FinalizeSummary {
    /// Unprocessed rooms found for the week.
    pub total_rooms: u32,
    /// Rooms fully committed this run.
    pub processed_rooms: u32,
    /// Rooms skipped for missing tier configuration.
    pub skipped_rooms: u32,
    /// Rooms that errored; left as they were, not retried this run.
    pub failed_rooms: u32,
    pub promoted: u32,
    pub demoted: u32,
    pub stayed: u32,
}

/// Per-room finalize result, before it is folded into the summary.
enum RoomFinalize {
    Processed { promoted: u32, demoted: u32, stayed: u32 },
    SkippedUnknownTier,
}

/// Batch-processes all unprocessed rooms of a week.
pub struct WeeklyFinalizer {
    storage: Arc<Storage>,
    identity: Arc<dyn Identity>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    catalog: TierCatalog,
    tracker: MembershipTracker,
    /// Shared with the allocator: a room's roster-read-to-commit span
    /// must not interleave with a join's check-then-admit.
    lock: RoomLock,
}

impl WeeklyFinalizer {
    pub fn new(
        storage: Arc<Storage>,
        identity: Arc<dyn Identity>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        catalog: TierCatalog,
        lock: RoomLock,
    ) -> Self {
        let tracker = MembershipTracker::new(storage.clone());
        Self {
            storage,
            identity,
            clock,
            notifier,
            catalog,
            tracker,
            lock,
        }
    }

    /// Finalize every unprocessed room of `week`. Always completes and
    /// reports; per-room failures never abort the batch.
    pub fn finalize_week(&self, week: WeekId) -> Result<FinalizeSummary> {
        let rooms: Vec<Room> = self
            .storage
            .rooms_for_week(week)?
            .into_iter()
            .filter(|r| !r.is_processed())
            .collect();

        let mut summary = FinalizeSummary {
            total_rooms: rooms.len() as u32,
            ..FinalizeSummary::default()
        };
        tracing::info!(%week, rooms = summary.total_rooms, "finalize batch starting");

        for room in rooms {
            let room_id = room.id.clone();
            match self.finalize_room(room) {
                Ok(RoomFinalize::Processed { promoted, demoted, stayed }) => {
                    summary.processed_rooms += 1;
                    summary.promoted += promoted;
                    summary.demoted += demoted;
                    summary.stayed += stayed;
                }
                Ok(RoomFinalize::SkippedUnknownTier) => {
                    summary.skipped_rooms += 1;
                }
                Err(e) => {
                    tracing::error!(room = %room_id, error = %e, "room finalize failed");
                    summary.failed_rooms += 1;
                }
            }
        }

        tracing::info!(
            %week,
            processed = summary.processed_rooms,
            skipped = summary.skipped_rooms,
            failed = summary.failed_rooms,
            promoted = summary.promoted,
            demoted = summary.demoted,
            stayed = summary.stayed,
            "finalize batch done"
        );
        Ok(summary)
    }

    fn finalize_room(&self, room: Room) -> Result<RoomFinalize> {
        // The week scan ran outside the lock; re-read the room under it
        // so a join that landed in between is neither lost nor able to
        // interleave with the commit below.
        let _rooms = self.lock.acquire();
        let mut room = self
            .storage
            .room(&room.id)?
            .ok_or_else(|| Error::Storage(format!("room {} vanished mid-batch", room.id)))?;
        if room.is_processed() {
            return Ok(RoomFinalize::Processed { promoted: 0, demoted: 0, stayed: 0 });
        }
        let Some(tier) = self.catalog.get(&room.tier) else {
            // Incomplete seed data is non-fatal; leave the room alone.
            tracing::warn!(room = %room.id, tier = %room.tier, "unknown tier, skipping room");
            return Ok(RoomFinalize::SkippedUnknownTier);
        };

        let mut members = self.tracker.roster_ordered(&room.id)?;
        if members.is_empty() {
            if room.mark_processed(self.clock.now_millis()) {
                self.storage.commit_finalized_room(&room, &[], &[])?;
            }
            tracing::debug!(room = %room.id, "empty room processed, no history");
            return Ok(RoomFinalize::Processed { promoted: 0, demoted: 0, stayed: 0 });
        }

        let total = members.len();
        let promote = promote_count(total, tier.promote_percent);
        let demote = demote_count(total, tier.demote_percent);
        let next = self.catalog.next_of(tier.order);
        let prev = self.catalog.prev_of(tier.order);

        let mut records = Vec::with_capacity(total);
        let (mut promoted, mut demoted, mut stayed) = (0u32, 0u32, 0u32);

        for (i, member) in members.iter_mut().enumerate() {
            let rank = (i + 1) as u32;
            let outcome = classify(
                rank as usize,
                total,
                promote,
                demote,
                next.is_some(),
                prev.is_some(),
            );
            match outcome {
                Outcome::Promoted => {
                    // next is present whenever classify promotes.
                    if let Some(next) = next {
                        self.identity.set_tier(&member.user_id, &next.name)?;
                    }
                    promoted += 1;
                }
                Outcome::Demoted => {
                    if let Some(prev) = prev {
                        self.identity.set_tier(&member.user_id, &prev.name)?;
                    }
                    demoted += 1;
                }
                Outcome::Stayed => stayed += 1,
            }
            member.rank_snapshot = Some(rank);
            records.push(HistoryRecord {
                user_id: member.user_id.clone(),
                period_type: PERIOD_WEEKLY.to_string(),
                period_id: room.week,
                points: member.points,
                rank,
                tier: tier.name.clone(),
                outcome,
            });
        }

        if !room.mark_processed(self.clock.now_millis()) {
            // Raced with another finalize run; nothing left to do.
            return Err(Error::Storage(format!("room {} already processed", room.id)));
        }
        self.storage.commit_finalized_room(&room, &members, &records)?;

        for record in &records {
            self.notifier.outcome(record);
        }

        tracing::info!(
            room = %room.id,
            tier = %room.tier,
            members = total,
            promoted,
            demoted,
            "room finalized"
        );
        Ok(RoomFinalize::Processed { promoted, demoted, stayed })
    }
}
