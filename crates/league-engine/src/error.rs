//! Error types for the league engine.
//!
//! [`Error`] covers operational faults (storage, serialization,
//! collaborators). Expected business rejections of the join flow are a
//! separate tagged type, [`JoinError`], carrying a machine-readable
//! code so API callers can branch without string matching.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage error
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Domain validation failed while materializing stored data
    #[error("domain error: {0}")]
    Domain(#[from] league_core::DomainError),

    /// The Identity collaborator failed or is unreachable
    #[error("identity error: {0}")]
    Identity(String),

    /// Not found
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(e: rocksdb::Error) -> Self {
        Error::Storage(e.to_string())
    }
}

/// Expected business rejections of the join flow.
///
/// These are outcomes, not faults: the room is full, the week is
/// closed. Each carries a stable code for machine handling; the
/// `Display` text is the human message.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    /// Every room of the user's tier for this week is at capacity and
    /// a new one could not be opened.
    #[error("no room with free capacity for tier {tier} in week {week}")]
    RoomFull { tier: String, week: String },

    /// The week's rooms for this tier are already finalized; joining
    /// now would dodge the promotion/demotion that just ran.
    #[error("week {week} is already finalized for tier {tier}")]
    WeekClosed { tier: String, week: String },

    /// The Identity collaborator could not resolve the user.
    #[error("identity lookup failed for user {user_id}: {reason}")]
    IdentityUnavailable { user_id: String, reason: String },

    /// The store rejected the write.
    #[error("storage rejected the join: {0}")]
    StorageFailed(String),
}

impl JoinError {
    /// Stable machine-readable code for API payloads.
    pub fn code(&self) -> &'static str {
        match self {
            JoinError::RoomFull { .. } => "ROOM_FULL",
            JoinError::WeekClosed { .. } => "WEEK_CLOSED",
            JoinError::IdentityUnavailable { .. } => "IDENTITY_UNAVAILABLE",
            JoinError::StorageFailed(_) => "STORAGE_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_error_codes_are_stable() {
        let err = JoinError::RoomFull {
            tier: "ISINMA".into(),
            week: "2025-W03".into(),
        };
        assert_eq!(err.code(), "ROOM_FULL");
        assert!(err.to_string().contains("ISINMA"));
    }
}
