//! Event types flowing through selection.
//!
//! A [`RawEvent`] is what a calendar source produces: absolute instants with
//! no zone information. Selection turns each one into an [`Event`] exactly
//! once, applying the all-day offset correction on the way, so an `Event`
//! can never be shifted a second time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::SECONDS_PER_DAY;

/// An event as delivered by a calendar source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
}

impl RawEvent {
    pub fn new(name: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        RawEvent {
            name: name.into(),
            start,
            end,
            location: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Starts at UTC midnight and ends at 23:59:59 UTC of some day.
    ///
    /// This is a property of the raw instants only; the viewer zone plays no
    /// part in it.
    pub fn is_all_day(&self) -> bool {
        let starts_at_midnight = self.start.timestamp().rem_euclid(SECONDS_PER_DAY) == 0;
        let ends_before_midnight = (self.end.timestamp() + 1).rem_euclid(SECONDS_PER_DAY) == 0;

        starts_at_midnight && ends_before_midnight
    }

    /// Classify this event and, if it is all-day, move its instants from UTC
    /// midnight to local midnight by subtracting `offset_seconds`.
    pub fn into_corrected(self, offset_seconds: i32) -> Event {
        let is_all_day = self.is_all_day();
        let shift = if is_all_day {
            Duration::seconds(i64::from(offset_seconds))
        } else {
            Duration::zero()
        };

        Event {
            name: self.name,
            start: self.start - shift,
            end: self.end - shift,
            location: self.location,
            is_all_day,
        }
    }
}

/// An event after all-day classification and correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    pub is_all_day: bool,
}

impl Event {
    /// `start <= now <= end`, on corrected instants.
    pub fn is_in_progress(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }
}

/// Turn a selected event back into source input. Used to feed a result
/// into another selection; the corrected instants are kept as they are.
impl From<Event> for RawEvent {
    fn from(event: Event) -> Self {
        RawEvent {
            name: event.name,
            start: event.start,
            end: event.end,
            location: event.location,
        }
    }
}
