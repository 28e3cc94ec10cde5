//! Time window a calendar source fetches events for.

use chrono::{DateTime, Duration, Utc};

use crate::constants::{DEFAULT_LOOK_AHEAD_DAYS, DEFAULT_LOOK_BACK_DAYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// One day back, seven days ahead.
    pub fn around(now: DateTime<Utc>) -> Self {
        FetchWindow::with_days(now, DEFAULT_LOOK_BACK_DAYS, DEFAULT_LOOK_AHEAD_DAYS)
    }

    pub fn with_days(now: DateTime<Utc>, look_back_days: i64, look_ahead_days: i64) -> Self {
        FetchWindow {
            start: now - Duration::days(look_back_days),
            end: now + Duration::days(look_ahead_days),
        }
    }

    /// True when `[start, end]` touches the window at all.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.end && end >= self.start
    }
}
