//! Option filtering, working-set ordering and the first-usable scan.

use chrono::{DateTime, Utc};

use crate::error::SelectError;
use crate::event::Event;
use crate::options::DisplayOptions;

/// Apply `include_all_day` then `only_all_day`.
///
/// Excluding all-day events and asking for all-day events only is allowed;
/// it always leaves nothing.
pub(crate) fn apply_options(
    mut events: Vec<Event>,
    options: &DisplayOptions,
) -> Result<Vec<Event>, SelectError> {
    if !options.include_all_day {
        events.retain(|e| !e.is_all_day);
        if events.is_empty() {
            return Err(SelectError::NoEventsAfterFilter);
        }
    }

    if options.only_all_day {
        events.retain(|e| e.is_all_day);
        if events.is_empty() {
            return Err(SelectError::NoEventsAfterFilter);
        }
    }

    Ok(events)
}

/// Narrow to in-progress events ordered by end when there are any and the
/// viewer wants them, otherwise order everything by start.
///
/// Both sorts are stable so equal keys keep their input order.
pub(crate) fn order_working_set(
    mut events: Vec<Event>,
    now: DateTime<Utc>,
    show_in_progress: bool,
) -> Vec<Event> {
    if show_in_progress && events.iter().any(|e| e.is_in_progress(now)) {
        events.retain(|e| e.is_in_progress(now));
        events.sort_by_key(|e| e.end);
    } else {
        events.sort_by_key(|e| e.start);
    }
    events
}

/// Index of the first event satisfying `usable`, scanning from the head.
pub(crate) fn first_usable<F>(events: &[Event], usable: F) -> Result<usize, SelectError>
where
    F: Fn(&Event) -> bool,
{
    events
        .iter()
        .position(usable)
        .ok_or(SelectError::NoEventsAfterFilter)
}
