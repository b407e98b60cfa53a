//! Domain error types.
//!
//! Construction-time validation failures. Expected business outcomes
//! (full room, duplicate membership) are not errors at this layer; the
//! engine models those as tagged results.

use thiserror::Error;

/// Errors raised when constructing domain values from invalid data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Tier name must be non-empty.
    #[error("tier name must not be empty")]
    EmptyTierName,

    /// Tier order starts at 1 (the lowest tier).
    #[error("tier order must be >= 1, got {0}")]
    InvalidTierOrder(u32),

    /// Room size bounds must satisfy 0 < min <= max.
    #[error("invalid room bounds for tier {name}: min {min}, max {max}")]
    InvalidRoomBounds { name: String, min: u32, max: u32 },

    /// A promotion/demotion percentage outside [0, 100].
    #[error("percentage out of range for tier {name}: {value}")]
    PercentOutOfRange { name: String, value: u8 },

    /// promote% + demote% must not exceed 100.
    #[error("promote + demote percentages exceed 100 for tier {name}: {sum}")]
    PercentSumExceeded { name: String, sum: u16 },

    /// Two catalog entries share a name or an order.
    #[error("duplicate tier {0} in catalog")]
    DuplicateTier(String),

    /// A catalog needs at least one tier to resolve fallbacks.
    #[error("tier catalog must not be empty")]
    EmptyCatalog,

    /// Week identifiers are ISO week strings, e.g. "2025-W03".
    #[error("invalid week identifier: {0}")]
    InvalidWeekId(String),

    /// A room's time window must end after it starts.
    #[error("room window must end after it starts: start {start}, end {end}")]
    InvalidWindow { start: i64, end: i64 },
}
