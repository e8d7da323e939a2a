//! Day keys and period ranges.
//!
//! Every daily record is partitioned by a [`DateKey`], the zero-padded
//! `YYYY-MM-DD` form of a local calendar day. Because the format is
//! order-preserving, range filters compare keys as plain strings.

use chrono::{Datelike, Duration, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(String);

impl DateKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `None` when the stored key is not a valid calendar day.
    pub fn to_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, "%Y-%m-%d").ok()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DateKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateKey,
    pub end: DateKey,
}

impl DateRange {
    /// Inclusive on both ends.
    pub fn contains(&self, key: &DateKey) -> bool {
        key >= &self.start && key <= &self.end
    }
}

/// Source of the local calendar day.
pub trait Clock: Send + Sync {
    fn today_date(&self) -> NaiveDate;

    fn today(&self) -> DateKey {
        DateKey::from_date(self.today_date())
    }

    /// RFC 3339 timestamp for `createdAt` and `lastUpdated` fields.
    fn timestamp(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today_date(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn timestamp(&self) -> String {
        Utc::now().to_rfc3339()
    }
}

/// A clock that only moves when told to. Used to simulate midnight.
#[derive(Debug)]
pub struct ManualClock {
    date: Mutex<NaiveDate>,
}

impl ManualClock {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date: Mutex::new(date),
        }
    }

    pub fn set(&self, date: NaiveDate) {
        if let Ok(mut guard) = self.date.lock() {
            *guard = date;
        }
    }

    pub fn advance_days(&self, days: i64) {
        if let Ok(mut guard) = self.date.lock() {
            *guard += Duration::days(days);
        }
    }
}

impl Clock for ManualClock {
    fn today_date(&self) -> NaiveDate {
        match self.date.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Midnight UTC of the simulated day.
    fn timestamp(&self) -> String {
        format!("{}T00:00:00+00:00", self.today_date())
    }
}

pub fn same_day(a: &DateKey, b: &DateKey) -> bool {
    a == b
}

/// Sunday through the following Saturday.
pub fn week_range(date: NaiveDate) -> DateRange {
    let start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);
    let end = start + Duration::days(6);
    DateRange {
        start: DateKey::from_date(start),
        end: DateKey::from_date(end),
    }
}

pub fn month_range(date: NaiveDate) -> DateRange {
    let start = date.with_day(1).unwrap_or(date);
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let end = next_month
        .map(|first| first - Duration::days(1))
        .unwrap_or(date);
    DateRange {
        start: DateKey::from_date(start),
        end: DateKey::from_date(end),
    }
}
