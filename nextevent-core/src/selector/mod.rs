//! Next-event selection.
//!
//! The pipeline, in order:
//! 1. resolve the viewer zone (fatal) and its current UTC offset (degrades to UTC)
//! 2. classify all-day events and shift them to local midnight
//! 3. apply `include_all_day` / `only_all_day`
//! 4. narrow to in-progress events or order everything by start
//! 5. skip events that already ended (the source looks one day back)
//! 6. when in-progress events are hidden, also skip events that already started
//! 7. compute display facts for the survivor

mod detail;
mod filter;

pub use detail::Detail;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::SelectError;
use crate::event::{Event, RawEvent};
use crate::options::DisplayOptions;
use crate::zone::{OffsetResolver, ZoneResolver};

use filter::{apply_options, first_usable, order_working_set};

/// The chosen event with its display facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub event: Event,
    pub detail: Detail,
}

pub struct EventSelector<R = ZoneResolver> {
    resolver: R,
}

impl Default for EventSelector<ZoneResolver> {
    fn default() -> Self {
        EventSelector::new(ZoneResolver::default())
    }
}

impl<R: OffsetResolver> EventSelector<R> {
    pub fn new(resolver: R) -> Self {
        EventSelector { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Pick the next relevant event for a viewer in `zone` at `now`.
    pub fn select(
        &self,
        events: Vec<RawEvent>,
        zone: &str,
        now: DateTime<Utc>,
        options: &DisplayOptions,
    ) -> Result<SelectionResult, SelectError> {
        if events.is_empty() {
            return Err(SelectError::EmptyInput);
        }

        let tz = self
            .resolver
            .resolve(zone)
            .map_err(|_| SelectError::UnknownZone(zone.to_string()))?;

        self.select_in(events, tz, now, options)
    }

    /// Same as [`select`](Self::select) for a zone the caller already resolved.
    pub fn select_in(
        &self,
        events: Vec<RawEvent>,
        tz: Tz,
        now: DateTime<Utc>,
        options: &DisplayOptions,
    ) -> Result<SelectionResult, SelectError> {
        if events.is_empty() {
            return Err(SelectError::EmptyInput);
        }

        let offset = self.offset_or_utc(tz, now);

        let events: Vec<Event> = events
            .into_iter()
            .map(|e| e.into_corrected(offset))
            .collect();

        let events = apply_options(events, options)?;
        debug!(count = events.len(), "events after option filter");

        let mut working = order_working_set(events, now, options.show_in_progress);

        let first_live = first_usable(&working, |e| e.end >= now)?;
        working.drain(..first_live);

        let index = if options.show_in_progress {
            0
        } else {
            first_usable(&working, |e| e.start > now)?
        };
        let event = working.swap_remove(index);

        let detail = Detail::compute(&event, tz, now);

        info!(
            name = %event.name,
            start = %event.start,
            end = %event.end,
            all_day = event.is_all_day,
            now = %now,
            "selected next event"
        );

        Ok(SelectionResult { event, detail })
    }

    fn offset_or_utc(&self, tz: Tz, now: DateTime<Utc>) -> i32 {
        match self.resolver.utc_offset(tz, now) {
            Ok(offset) => offset,
            Err(e) => {
                let degraded = SelectError::OffsetResolutionDegraded(e.to_string());
                warn!(zone = tz.name(), error = %degraded, "treating all-day events as UTC");
                0
            }
        }
    }
}
