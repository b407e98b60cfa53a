//! Collaborator ports.
//!
//! The league core does not own users, wall-clock time, or alert
//! delivery. Each is reached through a narrow trait so the engine stays
//! ignorant of everything but the fields it needs.

use crate::error::Result;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use league_core::{HistoryRecord, WeekId};

/// The slice of a user the league needs: current tier and point total.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRef {
    pub user_id: String,
    /// Current tier name as the Identity collaborator records it. May
    /// be absent or name a tier missing from the catalog; the join
    /// flow falls back to the lowest tier in both cases.
    pub tier: Option<String>,
    pub points: u64,
}

/// Port to the Identity collaborator that owns user profiles.
pub trait Identity: Send + Sync {
    /// Resolve a user's current tier and points.
    fn user(&self, user_id: &str) -> Result<UserRef>;

    /// Record a tier change decided by finalize.
    fn set_tier(&self, user_id: &str, tier: &str) -> Result<()>;
}

/// Port to the time source: "today" and "now" in the deployment's
/// fixed civil calendar.
pub trait Clock: Send + Sync {
    /// Current instant, unix millis.
    fn now_millis(&self) -> i64;

    /// Today's civil date.
    fn today(&self) -> NaiveDate;

    /// The fixed civil-timezone offset.
    fn utc_offset(&self) -> FixedOffset;

    /// The week containing today.
    fn current_week(&self) -> WeekId {
        WeekId::from_date(self.today())
    }

    /// Turn a naive civil datetime (e.g. a week boundary) into unix
    /// millis under the fixed offset.
    fn civil_to_millis(&self, naive: NaiveDateTime) -> i64 {
        self.utc_offset()
            .from_local_datetime(&naive)
            .single()
            .map_or_else(|| naive.and_utc().timestamp_millis(), |dt| dt.timestamp_millis())
    }
}

/// Wall clock with a fixed UTC offset (e.g. +3 for TRT).
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    /// Build from whole hours east of UTC. Out-of-range offsets fall
    /// back to UTC.
    pub fn from_offset_hours(hours: i32) -> Self {
        let offset = FixedOffset::east_opt(hours * 3600)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"));
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.offset).date_naive()
    }

    fn utc_offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Port to the Notification collaborator. Fire-and-forget: delivery
/// failures never affect finalize.
pub trait Notifier: Send + Sync {
    /// Announce one member's finalize outcome.
    fn outcome(&self, record: &HistoryRecord);
}

/// Default notifier: emits a tracing event and nothing else. Real push
/// delivery is the Notification collaborator's job.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn outcome(&self, record: &HistoryRecord) {
        tracing::info!(
            user = %record.user_id,
            week = %record.period_id,
            outcome = %record.outcome,
            rank = record.rank,
            "league outcome"
        );
    }
}
