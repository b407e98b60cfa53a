//! ISO week identifiers.
//!
//! A competition period is one ISO week, keyed by a "YYYY-Www" string
//! (e.g. "2025-W03"). The civil window runs Monday 00:00 through the
//! following Monday 00:00; the engine applies the deployment's fixed
//! UTC offset to turn these naive bounds into instants.

use crate::error::DomainError;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Weekday};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An ISO week identifier, e.g. "2025-W03".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeekId {
    year: i32,
    week: u32,
}

impl WeekId {
    /// Construct from an ISO year and week number (1-52/53).
    pub fn new(year: i32, week: u32) -> Result<Self, DomainError> {
        // from_isoywd rejects week 0 and weeks past the year's last.
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or_else(|| DomainError::InvalidWeekId(format!("{year:04}-W{week:02}")))
    }

    /// The week containing a civil date.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    /// ISO year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// ISO week number within the year.
    pub fn week(&self) -> u32 {
        self.week
    }

    /// Monday 00:00 of this week (naive civil time).
    pub fn start(&self) -> NaiveDateTime {
        // Valid by construction.
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or_default()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
    }

    /// Monday 00:00 of the following week (exclusive end).
    pub fn end(&self) -> NaiveDateTime {
        self.start()
            .checked_add_days(Days::new(7))
            .unwrap_or_else(|| self.start())
    }

    /// The following week (crosses year boundaries).
    pub fn next(&self) -> Self {
        Self::from_date(
            self.start()
                .date()
                .checked_add_days(Days::new(7))
                .unwrap_or_else(|| self.start().date()),
        )
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidWeekId(s.to_string());
        let (year, week) = s.split_once("-W").ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;
        Self::new(year, week).map_err(|_| invalid())
    }
}

impl Serialize for WeekId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WeekId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
