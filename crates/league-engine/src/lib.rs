//! League engine - the operational core of the weekly tier league.
//!
//! Architecture:
//! - Shared RocksDB [`Storage`] with prefixed JSON keys; every
//!   multi-key mutation goes through a single `WriteBatch`
//! - Narrow ports for the collaborators the league does not own:
//!   [`Identity`] (user tier), [`Clock`] (civil time), [`Notifier`]
//!   (outcome alerts)
//! - [`RoomAllocator`] - interactive join flow (find-or-create a room,
//!   admit exactly once per week)
//! - [`MembershipTracker`] - live ranks, rosters, point recording
//! - [`WeeklyFinalizer`] - the end-of-week batch: rank, promote or
//!   demote, append history, mark rooms processed

mod allocator;
mod error;
mod finalizer;
mod ports;
mod storage;
#[cfg(test)]
mod testutil;
mod tracker;

pub use allocator::{JoinOutcome, RoomAllocator};
pub use error::{Error, JoinError, Result};
pub use finalizer::{FinalizeSummary, WeeklyFinalizer};
pub use ports::{Clock, Identity, LogNotifier, Notifier, SystemClock, UserRef};
pub use storage::{RoomLock, Storage};
pub use tracker::{MembershipTracker, RankedMember, RoomSummary};
