//! Shared stubs for engine tests: a scriptable Identity port and a
//! fixed clock.

use crate::error::{Error, Result};
use crate::ports::{Clock, Identity, UserRef};
use chrono::{FixedOffset, NaiveDate};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory Identity port with switchable failure modes.
pub struct StubIdentity {
    users: Mutex<HashMap<String, UserRef>>,
    fail_lookups: AtomicBool,
    /// User ids whose `set_tier` fails (to exercise per-room isolation).
    fail_set_tier_for: Mutex<Vec<String>>,
}

impl StubIdentity {
    pub fn new() -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            fail_lookups: AtomicBool::new(false),
            fail_set_tier_for: Mutex::new(Vec::new()),
        }
    }

    pub fn insert(&self, user_id: &str, tier: Option<&str>, points: u64) {
        self.users.lock().unwrap().insert(
            user_id.to_string(),
            UserRef {
                user_id: user_id.to_string(),
                tier: tier.map(str::to_string),
                points,
            },
        );
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set_tier_for(&self, user_id: &str) {
        self.fail_set_tier_for
            .lock()
            .unwrap()
            .push(user_id.to_string());
    }

    pub fn tier_of(&self, user_id: &str) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .get(user_id)
            .and_then(|u| u.tier.clone())
    }
}

impl Identity for StubIdentity {
    fn user(&self, user_id: &str) -> Result<UserRef> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::Identity("stubbed outage".into()));
        }
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserRef {
                user_id: user_id.to_string(),
                tier: None,
                points: 0,
            }))
    }

    fn set_tier(&self, user_id: &str, tier: &str) -> Result<()> {
        if self
            .fail_set_tier_for
            .lock()
            .unwrap()
            .iter()
            .any(|u| u == user_id)
        {
            return Err(Error::Identity(format!("stubbed set_tier failure for {user_id}")));
        }
        let mut users = self.users.lock().unwrap();
        let entry = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserRef {
                user_id: user_id.to_string(),
                tier: None,
                points: 0,
            });
        entry.tier = Some(tier.to_string());
        Ok(())
    }
}

/// Clock pinned to a fixed instant and date, UTC.
pub struct FixedClock {
    now_millis: i64,
    today: NaiveDate,
}

impl FixedClock {
    pub fn at(now_millis: i64) -> Self {
        Self {
            now_millis,
            today: NaiveDate::from_ymd_opt(2025, 1, 15).expect("valid date"),
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now_millis
    }

    fn today(&self) -> NaiveDate {
        self.today
    }

    fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(0).expect("zero offset is valid")
    }
}
