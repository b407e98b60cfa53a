//! Persistent storage using RocksDB.
//!
//! Values are JSON documents under prefixed string keys:
//!
//! - `room:{id}` - the room itself
//! - `roomidx:{week}:{tier}:{id}` - find rooms of a (week, tier)
//! - `weekidx:{week}:{id}` - finalize scans a whole week
//! - `member:{week}:{user}` - the (user, week) uniqueness key
//! - `roster:{room}:{user}` - room roster scans
//! - `history:{user}:{week}` - the append-only ledger
//!
//! Mutations that must land together (room plus its index rows, a
//! membership plus the bumped population, a finalized room's full
//! mutation set) go through a single `WriteBatch`, so a crash cannot
//! leave a membership pointing at an unpersisted room or a processed
//! room with half its history written.

use crate::error::{Error, Result};
use league_core::{HistoryRecord, Membership, Room, WeekId};
use rocksdb::{Options, WriteBatch, DB};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Escape a caller-supplied key segment.
///
/// User ids, tier names, and room ids arrive as arbitrary strings; a
/// `:` inside one would alias another key or widen a prefix scan (the
/// ledger of user `x` must never pick up rows of a user literally
/// named `x:evil`). `%` first so the escaping round-trips.
fn esc(segment: &str) -> String {
    segment.replace('%', "%25").replace(':', "%3A")
}

/// Serializes every read-modify-write of room state.
///
/// The join flow's check-then-admit and the finalizer's
/// read-rank-commit both hold this lock, so a join can never write a
/// stale `Unprocessed` copy of a room the finalizer just committed,
/// and two joiners can never both take a room's last slot.
#[derive(Clone, Default)]
pub struct RoomLock(Arc<Mutex<()>>);

impl RoomLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Storage backend for league data.
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create storage at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path)?;
        Ok(Self { db })
    }

    // --- Rooms ---

    fn room_key(id: &str) -> String {
        format!("room:{}", esc(id))
    }

    fn room_index_key(week: WeekId, tier: &str, id: &str) -> String {
        format!("roomidx:{week}:{}:{}", esc(tier), esc(id))
    }

    fn week_index_key(week: WeekId, id: &str) -> String {
        format!("weekidx:{week}:{}", esc(id))
    }

    /// Get a room by id.
    pub fn room(&self, id: &str) -> Result<Option<Room>> {
        self.get_json(&Self::room_key(id))
    }

    /// Persist a brand-new room together with both index rows.
    pub fn create_room(&self, room: &Room) -> Result<()> {
        let mut batch = WriteBatch::default();
        batch.put(Self::room_key(&room.id), serde_json::to_vec(room)?);
        batch.put(
            Self::room_index_key(room.week, &room.tier, &room.id),
            room.id.as_bytes(),
        );
        batch.put(Self::week_index_key(room.week, &room.id), room.id.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    /// Persist a brand-new room and its founding member as one unit,
    /// so a crash cannot leave either side dangling.
    pub fn create_room_with_member(&self, room: &Room, member: &Membership) -> Result<()> {
        let doc = serde_json::to_vec(member)?;
        let mut batch = WriteBatch::default();
        batch.put(Self::room_key(&room.id), serde_json::to_vec(room)?);
        batch.put(
            Self::room_index_key(room.week, &room.tier, &room.id),
            room.id.as_bytes(),
        );
        batch.put(Self::week_index_key(room.week, &room.id), room.id.as_bytes());
        batch.put(Self::member_key(member.week, &member.user_id), &doc);
        batch.put(Self::roster_key(&member.room_id, &member.user_id), &doc);
        self.db.write(batch)?;
        Ok(())
    }

    /// Rooms of a (week, tier), any state.
    pub fn rooms_for(&self, week: WeekId, tier: &str) -> Result<Vec<Room>> {
        let prefix = format!("roomidx:{week}:{}:", esc(tier));
        self.rooms_by_index(&prefix)
    }

    /// All rooms of a week across tiers.
    pub fn rooms_for_week(&self, week: WeekId) -> Result<Vec<Room>> {
        let prefix = format!("weekidx:{week}:");
        self.rooms_by_index(&prefix)
    }

    fn rooms_by_index(&self, prefix: &str) -> Result<Vec<Room>> {
        let mut rooms = Vec::new();
        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            let id = std::str::from_utf8(&value)
                .map_err(|e| Error::Storage(format!("corrupt index row: {e}")))?;
            match self.room(id)? {
                Some(room) => rooms.push(room),
                None => return Err(Error::Storage(format!("index points at missing room {id}"))),
            }
        }
        Ok(rooms)
    }

    // --- Memberships ---

    fn member_key(week: WeekId, user_id: &str) -> String {
        format!("member:{week}:{}", esc(user_id))
    }

    fn roster_key(room_id: &str, user_id: &str) -> String {
        format!("roster:{}:{}", esc(room_id), esc(user_id))
    }

    /// The one membership of (user, week), if it exists.
    pub fn membership(&self, week: WeekId, user_id: &str) -> Result<Option<Membership>> {
        self.get_json(&Self::member_key(week, user_id))
    }

    /// Persist a new membership and the room with its bumped
    /// population as one unit.
    pub fn insert_member(&self, room: &Room, member: &Membership) -> Result<()> {
        let doc = serde_json::to_vec(member)?;
        let mut batch = WriteBatch::default();
        batch.put(Self::member_key(member.week, &member.user_id), &doc);
        batch.put(Self::roster_key(&member.room_id, &member.user_id), &doc);
        batch.put(Self::room_key(&room.id), serde_json::to_vec(room)?);
        self.db.write(batch)?;
        Ok(())
    }

    /// Overwrite a membership's mutable fields (points accrual). Both
    /// copies are rewritten together.
    pub fn update_member(&self, member: &Membership) -> Result<()> {
        let doc = serde_json::to_vec(member)?;
        let mut batch = WriteBatch::default();
        batch.put(Self::member_key(member.week, &member.user_id), &doc);
        batch.put(Self::roster_key(&member.room_id, &member.user_id), &doc);
        self.db.write(batch)?;
        Ok(())
    }

    /// All memberships of a room.
    pub fn roster(&self, room_id: &str) -> Result<Vec<Membership>> {
        let prefix = format!("roster:{}:", esc(room_id));
        let mut members = Vec::new();
        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            members.push(serde_json::from_slice(&value)?);
        }
        Ok(members)
    }

    // --- History ---

    fn history_key(user_id: &str, week: WeekId) -> String {
        format!("history:{}:{week}", esc(user_id))
    }

    /// The ledger row of (user, week), if finalize has written one.
    pub fn history_row(&self, user_id: &str, week: WeekId) -> Result<Option<HistoryRecord>> {
        self.get_json(&Self::history_key(user_id, week))
    }

    /// A user's ledger, most recent week first, at most `limit` rows.
    pub fn history_for(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryRecord>> {
        let prefix = format!("history:{}:", esc(user_id));
        let mut records: Vec<HistoryRecord> = Vec::new();
        for item in self.db.prefix_iterator(prefix.as_bytes()) {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            records.push(serde_json::from_slice(&value)?);
        }
        // Keys sort by week string, which is chronological; flip to
        // most-recent-first before applying the limit.
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    // --- Finalize commit ---

    /// Commit one finalized room as a single unit: every member's rank
    /// snapshot, every history row, and the processed room.
    pub fn commit_finalized_room(
        &self,
        room: &Room,
        members: &[Membership],
        records: &[HistoryRecord],
    ) -> Result<()> {
        let mut batch = WriteBatch::default();
        for member in members {
            let doc = serde_json::to_vec(member)?;
            batch.put(Self::member_key(member.week, &member.user_id), &doc);
            batch.put(Self::roster_key(&member.room_id, &member.user_id), &doc);
        }
        for record in records {
            batch.put(
                Self::history_key(&record.user_id, record.period_id),
                serde_json::to_vec(record)?,
            );
        }
        batch.put(Self::room_key(&room.id), serde_json::to_vec(room)?);
        self.db.write(batch)?;
        Ok(())
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }
}
