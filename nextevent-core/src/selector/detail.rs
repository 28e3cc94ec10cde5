//! Display facts for the selected event.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Display facts about the selected event, relative to `now`.
///
/// Counters are signed and truncate toward zero, so they go negative once
/// the event has started (or ended).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detail {
    pub in_progress: bool,
    pub is_all_day: bool,
    pub is_today: bool,
    pub is_tomorrow: bool,
    pub is_this_week: bool,
    pub minutes_until_start: i64,
    pub minutes_until_end: i64,
    pub hours_until_end: i64,
}

impl Detail {
    /// Day comparisons use calendar dates in `tz`, never UTC.
    pub fn compute(event: &Event, tz: Tz, now: DateTime<Utc>) -> Self {
        let until_start = (event.start - now).num_seconds();
        let until_end = (event.end - now).num_seconds();

        let today = now.with_timezone(&tz).date_naive();
        let start_day = event.start.with_timezone(&tz).date_naive();

        Detail {
            // One-sided on purpose: an event that already ended still reads as started.
            in_progress: now >= event.start,
            is_all_day: event.is_all_day,
            is_today: today == start_day,
            is_tomorrow: today.succ_opt() == Some(start_day),
            is_this_week: now < event.start + Duration::days(7),
            minutes_until_start: until_start / 60,
            minutes_until_end: until_end / 60,
            hours_until_end: until_end / 3600,
        }
    }
}
