//! Node-local user directory.
//!
//! The league core treats identity as an external collaborator behind
//! the [`Identity`] port. This directory is the in-tree stand-in: a
//! small RocksDB store of `user:{id}` documents, enough to run a node
//! without a separate identity service.

use league_engine::{Error, Identity, Result, UserRef};
use rocksdb::{Options, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserDoc {
    user_id: String,
    tier: Option<String>,
    points: u64,
}

/// RocksDB-backed Identity port implementation.
pub struct UserDirectory {
    db: DB,
}

impl UserDirectory {
    /// Open or create the directory at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        let db = DB::open(&opts, path).map_err(|e| Error::Storage(e.to_string()))?;
        Ok(Self { db })
    }

    fn key(user_id: &str) -> String {
        format!("user:{user_id}")
    }

    // Directory failures surface as Identity errors: to the engine
    // this store IS the identity collaborator, and the join flow turns
    // them into IDENTITY_UNAVAILABLE rejections.
    fn load(&self, user_id: &str) -> Result<Option<UserDoc>> {
        match self
            .db
            .get(Self::key(user_id).as_bytes())
            .map_err(|e| Error::Identity(e.to_string()))?
        {
            Some(data) => Ok(Some(serde_json::from_slice(&data).map_err(|e| {
                Error::Identity(format!("corrupt record for {user_id}: {e}"))
            })?)),
            None => Ok(None),
        }
    }

    fn store(&self, doc: &UserDoc) -> Result<()> {
        let data = serde_json::to_vec(doc)
            .map_err(|e| Error::Identity(e.to_string()))?;
        self.db
            .put(Self::key(&doc.user_id).as_bytes(), data)
            .map_err(|e| Error::Identity(e.to_string()))
    }

    /// Create or update a user record.
    pub fn upsert(&self, user_id: &str, tier: Option<&str>, points: Option<u64>) -> Result<UserRef> {
        let mut doc = self.load(user_id)?.unwrap_or(UserDoc {
            user_id: user_id.to_string(),
            tier: None,
            points: 0,
        });
        if let Some(tier) = tier {
            doc.tier = Some(tier.to_string());
        }
        if let Some(points) = points {
            doc.points = points;
        }
        self.store(&doc)?;
        Ok(UserRef {
            user_id: doc.user_id,
            tier: doc.tier,
            points: doc.points,
        })
    }
}

impl Identity for UserDirectory {
    fn user(&self, user_id: &str) -> Result<UserRef> {
        // An unseen user is a brand-new player: no tier yet, the join
        // flow will drop them into the lowest bracket.
        let doc = self.load(user_id)?.unwrap_or(UserDoc {
            user_id: user_id.to_string(),
            tier: None,
            points: 0,
        });
        Ok(UserRef {
            user_id: doc.user_id,
            tier: doc.tier,
            points: doc.points,
        })
    }

    fn set_tier(&self, user_id: &str, tier: &str) -> Result<()> {
        self.upsert(user_id, Some(tier), None).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unseen_user_has_no_tier() {
        let dir = TempDir::new().unwrap();
        let directory = UserDirectory::open(dir.path()).unwrap();
        let user = directory.user("fresh").unwrap();
        assert_eq!(user.tier, None);
        assert_eq!(user.points, 0);
    }

    #[test]
    fn set_tier_persists() {
        let dir = TempDir::new().unwrap();
        let directory = UserDirectory::open(dir.path()).unwrap();
        directory.upsert("u1", None, Some(40)).unwrap();
        directory.set_tier("u1", "SILVER").unwrap();
        let user = directory.user("u1").unwrap();
        assert_eq!(user.tier.as_deref(), Some("SILVER"));
        assert_eq!(user.points, 40);
    }

    #[test]
    fn corrupt_record_reads_as_identity_error() {
        let dir = TempDir::new().unwrap();
        let directory = UserDirectory::open(dir.path()).unwrap();
        directory
            .db
            .put(UserDirectory::key("u1").as_bytes(), b"not json")
            .unwrap();
        let err = directory.user("u1").unwrap_err();
        assert!(matches!(err, Error::Identity(_)), "got {err:?}");
    }
}
