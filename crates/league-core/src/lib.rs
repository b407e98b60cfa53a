//! Weekly Tier League — domain rules
//!
//! Pure logic for a recurring, tier-based competitive league: users are
//! grouped into capacity-bounded rooms per ISO week and per skill tier,
//! accumulate points during the week, and at week's end are promoted,
//! demoted, or retained based on their rank within the room.
//!
//! # Core Types
//!
//! - [`TierDefinition`] / [`TierCatalog`] - ordered skill brackets with
//!   promotion/demotion percentages and room-size bounds
//! - [`WeekId`] - ISO week identifier with civil Monday-to-Monday bounds
//! - [`Room`] / [`RoomState`] - a capacity-bounded group for one
//!   (week, tier), with a one-way `Unprocessed -> Processed` transition
//! - [`Membership`] - a user's seat in a room plus points and rank rules
//! - [`HistoryRecord`] / [`Outcome`] - the append-only finalize ledger
//!
//! # Ranking
//!
//! Live ranks are shared: `rank = 1 + members strictly ahead`, so ties
//! share a number. The finalize walk instead assigns positional ranks
//! from the canonical ordering (points descending, earlier join wins a
//! tie). Cutoffs are `ceil(n * promote% / 100)` from the top and
//! `floor(n * demote% / 100)` from the bottom.
//!
//! No I/O lives here; storage and collaborator ports are the engine's
//! concern.

mod error;
mod finalize;
mod membership;
mod room;
mod tier;
mod week;

pub use error::DomainError;
pub use finalize::{
    classify, demote_count, promote_count, HistoryRecord, Outcome, PERIOD_WEEKLY,
};
pub use membership::{canonical_order, shared_rank, sort_canonical, Membership};
pub use room::{Room, RoomState};
pub use tier::{TierCatalog, TierDefinition};
pub use week::WeekId;
