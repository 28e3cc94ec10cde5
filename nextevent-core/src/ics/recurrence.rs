//! RRULE expansion for recurring events.
//!
//! Expands a master event into the occurrences that touch the fetch window.
//! EXDATEs and overridden occurrences arrive as a set of instants to skip.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use rrule::RRuleSet;

use crate::constants::MAX_RECURRENCE_INSTANCES;
use crate::error::{NextEventError, NextEventResult};
use crate::event::RawEvent;
use crate::ics::parse::{Clock, ParsedEvent};
use crate::window::FetchWindow;
use crate::zone::{OffsetResolver, local_to_utc};

/// Build an iCalendar-format DTSTART line for the rrule crate parser.
///
/// All-day dates become midnight UTC, matching how their instants are
/// reported. Zone names go through the resolver so Windows TZIDs reach rrule
/// as IANA names.
fn dtstart_line<R: OffsetResolver>(dtstart: &DatePerhapsTime, clock: &Clock<'_, R>) -> String {
    match dtstart {
        DatePerhapsTime::Date(d) => format!("DTSTART:{}T000000Z", d.format("%Y%m%d")),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => {
            format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ"))
        }
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(dt)) => format!(
            "DTSTART;TZID={}:{}",
            clock.viewer.name(),
            dt.format("%Y%m%dT%H%M%S")
        ),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => format!(
            "DTSTART;TZID={}:{}",
            clock.zone(tzid).name(),
            date_time.format("%Y%m%dT%H%M%S")
        ),
    }
}

/// Rewrite `UNTIL` as a UTC date-time, which is the only form the rrule
/// crate accepts next to our DTSTART lines.
///
/// A date-only `UNTIL=20250301` (Google emits these for all-day series) means
/// the whole of that day; floating date-times are read in the event's zone.
fn normalize_until<R: OffsetResolver>(
    rrule: &str,
    dtstart: &DatePerhapsTime,
    clock: &Clock<'_, R>,
) -> String {
    rrule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                match until_utc(value, dtstart, clock) {
                    Some(until) => format!("UNTIL={}", until.format("%Y%m%dT%H%M%SZ")),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn until_utc<R: OffsetResolver>(
    value: &str,
    dtstart: &DatePerhapsTime,
    clock: &Clock<'_, R>,
) -> Option<DateTime<Utc>> {
    if value.ends_with('Z') {
        return None;
    }

    let local = match NaiveDate::parse_from_str(value, "%Y%m%d") {
        Ok(date) => date.and_time(NaiveTime::from_hms_opt(23, 59, 59)?),
        Err(_) => NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?,
    };

    match dtstart {
        DatePerhapsTime::Date(_) | DatePerhapsTime::DateTime(CalendarDateTime::Utc(_)) => {
            Some(local.and_utc())
        }
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(_)) => {
            local_to_utc(clock.viewer, local)
        }
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { tzid, .. }) => {
            local_to_utc(clock.zone(tzid), local)
        }
    }
}

/// Expand `master` into occurrences overlapping `window`, each lasting as
/// long as the master does. Occurrences starting at an instant in `skip` are
/// dropped.
pub(crate) fn expand<R: OffsetResolver>(
    master: &ParsedEvent,
    rrule: &str,
    skip: &HashSet<DateTime<Utc>>,
    window: &FetchWindow,
    clock: &Clock<'_, R>,
) -> NextEventResult<Vec<RawEvent>> {
    let rrule_str = format!(
        "{}\nRRULE:{}",
        dtstart_line(&master.dtstart, clock),
        normalize_until(rrule, &master.dtstart, clock)
    );

    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e: rrule::RRuleError| {
        NextEventError::Recurrence(format!(
            "Failed to parse RRULE for event '{}': {}",
            master.event.name, e
        ))
    })?;

    let duration = master.event.end - master.event.start;

    // after/before are exclusive; widen by a second. Occurrences that started
    // before the window but are still running must be kept too.
    let tz: rrule::Tz = Utc.into();
    let after = (window.start - duration - Duration::seconds(1)).with_timezone(&tz);
    let before = (window.end + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set
        .after(after)
        .before(before)
        .all(MAX_RECURRENCE_INSTANCES);

    let instances = result
        .dates
        .iter()
        .map(|occurrence| occurrence.with_timezone(&Utc))
        .filter(|start| !skip.contains(start))
        .map(|start| RawEvent {
            name: master.event.name.clone(),
            start,
            end: start + duration,
            location: master.event.location.clone(),
        })
        .filter(|e| window.overlaps(e.start, e.end))
        .collect();

    Ok(instances)
}
