//! ICS feed parsing using the icalendar crate's parser.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::{debug, warn};

use crate::error::{NextEventError, NextEventResult};
use crate::event::RawEvent;
use crate::ics::recurrence;
use crate::window::FetchWindow;
use crate::zone::{OffsetResolver, local_to_utc};

/// Parse a whole VCALENDAR into raw events that touch `window`.
///
/// Recurring events are expanded into their occurrences. Floating times and
/// TZIDs that cannot be resolved are read in the viewer's zone.
pub fn parse_calendar<R: OffsetResolver>(
    content: &str,
    viewer: Tz,
    window: &FetchWindow,
    resolver: &R,
) -> NextEventResult<Vec<RawEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| NextEventError::IcsParse(e.to_string()))?;

    let clock = Clock { viewer, resolver };

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    // (UID, RECURRENCE-ID) pairs that replace a generated occurrence
    let overrides: HashSet<(String, DateTime<Utc>)> = vevents
        .iter()
        .filter_map(|vevent| {
            let uid = vevent.find_prop("UID")?.val.to_string();
            let recurrence_id = DatePerhapsTime::try_from(vevent.find_prop("RECURRENCE-ID")?).ok()?;
            Some((uid, clock.start(&recurrence_id)?))
        })
        .collect();

    let mut events = Vec::new();

    for vevent in vevents {
        if is_cancelled(vevent) {
            continue;
        }

        let Some(parsed) = ParsedEvent::from_component(vevent, &clock) else {
            warn!(
                uid = ?vevent.find_prop("UID").map(|p| p.val.to_string()),
                "skipping VEVENT without a usable DTSTART"
            );
            continue;
        };

        let Some(rrule) = vevent.find_prop("RRULE") else {
            if window.overlaps(parsed.event.start, parsed.event.end) {
                events.push(parsed.event);
            }
            continue;
        };

        let mut skip: HashSet<DateTime<Utc>> = vevent
            .properties
            .iter()
            .filter(|p| p.name == "EXDATE")
            .flat_map(|p| parse_exdate_property(p, &clock))
            .collect();
        if let Some(uid) = &parsed.uid {
            skip.extend(
                overrides
                    .iter()
                    .filter(|(o_uid, _)| o_uid == uid)
                    .map(|(_, at)| *at),
            );
        }

        match recurrence::expand(&parsed, rrule.val.as_ref(), &skip, window, &clock) {
            Ok(instances) => events.extend(instances),
            Err(e) => {
                warn!(name = %parsed.event.name, error = %e, "could not expand RRULE, keeping first occurrence");
                if window.overlaps(parsed.event.start, parsed.event.end) {
                    events.push(parsed.event);
                }
            }
        }
    }

    events.sort_by_key(|e| e.start);
    debug!(count = events.len(), "parsed calendar");

    Ok(events)
}

/// A VEVENT reduced to what selection needs, plus the DTSTART recurrence
/// expansion is anchored on.
pub(crate) struct ParsedEvent {
    pub uid: Option<String>,
    pub event: RawEvent,
    pub dtstart: DatePerhapsTime,
}

impl ParsedEvent {
    fn from_component<R: OffsetResolver>(vevent: &Component<'_>, clock: &Clock<'_, R>) -> Option<Self> {
        let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
        let name = vevent
            .find_prop("SUMMARY")
            .map(|p| p.val.to_string())
            .unwrap_or_else(|| "(No title)".to_string());
        let location = vevent
            .find_prop("LOCATION")
            .map(|p| p.val.to_string())
            .filter(|l| !l.is_empty());

        let dtstart = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?;
        let start = clock.start(&dtstart)?;

        let end = match vevent
            .find_prop("DTEND")
            .and_then(|p| DatePerhapsTime::try_from(p).ok())
        {
            Some(dtend) => clock.end(&dtend)?,
            // No DTEND: a date lasts one day, a date-time is instantaneous.
            None => match &dtstart {
                DatePerhapsTime::Date(_) => start + Duration::days(1) - Duration::seconds(1),
                DatePerhapsTime::DateTime(_) => start,
            },
        };

        Some(ParsedEvent {
            uid,
            event: RawEvent {
                name,
                start,
                end,
                location,
            },
            dtstart,
        })
    }
}

/// Converts iCalendar times to instants for one viewer.
pub(crate) struct Clock<'a, R> {
    pub viewer: Tz,
    pub resolver: &'a R,
}

impl<R: OffsetResolver> Clock<'_, R> {
    /// Zone named by a TZID parameter, aliases included.
    pub fn zone(&self, tzid: &str) -> Tz {
        self.resolver.resolve(tzid).unwrap_or_else(|e| {
            warn!(tzid, error = %e, "unknown TZID, using viewer zone");
            self.viewer
        })
    }

    /// Dates start at UTC midnight.
    pub fn start(&self, time: &DatePerhapsTime) -> Option<DateTime<Utc>> {
        match time {
            DatePerhapsTime::Date(date) => midnight_utc(*date),
            DatePerhapsTime::DateTime(dt) => self.date_time(dt),
        }
    }

    /// An end date is exclusive, so it becomes 23:59:59 UTC of the day before.
    pub fn end(&self, time: &DatePerhapsTime) -> Option<DateTime<Utc>> {
        match time {
            DatePerhapsTime::Date(date) => midnight_utc(*date).map(|m| m - Duration::seconds(1)),
            DatePerhapsTime::DateTime(dt) => self.date_time(dt),
        }
    }

    fn date_time(&self, dt: &CalendarDateTime) -> Option<DateTime<Utc>> {
        match dt {
            CalendarDateTime::Utc(dt) => Some(*dt),
            CalendarDateTime::Floating(naive) => local_to_utc(self.viewer, *naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                local_to_utc(self.zone(tzid), *date_time)
            }
        }
    }
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
}

/// VEVENTs at any depth; some feeds nest them under the VCALENDAR component.
fn collect_vevents<'c, 'a>(components: &'c [Component<'a>], out: &mut Vec<&'c Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

fn is_cancelled(vevent: &Component<'_>) -> bool {
    vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref() == "CANCELLED")
}

/// Parse an EXDATE property into the instants it excludes.
///
/// Handles `TZID=`, `VALUE=DATE`, UTC and floating values, comma-separated.
fn parse_exdate_property<R: OffsetResolver>(prop: &Property<'_>, clock: &Clock<'_, R>) -> Vec<DateTime<Utc>> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    let zone = match &tzid {
        Some(tzid) => clock.zone(tzid),
        None => clock.viewer,
    };

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            if is_date {
                NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .and_then(midnight_utc)
            } else if let Some(utc) = s.strip_suffix('Z') {
                chrono::NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| dt.and_utc())
            } else {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .and_then(|dt| local_to_utc(zone, dt))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::ZoneResolver;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 17, 0, 0).unwrap()
    }

    fn parse(ics: &str) -> Vec<RawEvent> {
        parse_calendar(
            ics,
            Tz::America__New_York,
            &FetchWindow::around(now()),
            &ZoneResolver::default(),
        )
        .expect("Should parse")
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_parse_mixed_calendar() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//nextevent//test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:utc-1\r\n\
SUMMARY:Dentist\r\n\
LOCATION:12 Main St\r\n\
DTSTART:20250115T180000Z\r\n\
DTEND:20250115T190000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:win-1\r\n\
SUMMARY:Standup\r\n\
DTSTART;TZID=Eastern Standard Time:20250116T090000\r\n\
DTEND;TZID=Eastern Standard Time:20250116T091500\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:allday-1\r\n\
SUMMARY:Holiday\r\n\
DTSTART;VALUE=DATE:20250120\r\n\
DTEND;VALUE=DATE:20250121\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:cancelled-1\r\n\
SUMMARY:Cancelled\r\n\
STATUS:CANCELLED\r\n\
DTSTART:20250116T120000Z\r\n\
DTEND:20250116T130000Z\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:old-1\r\n\
SUMMARY:Last month\r\n\
DTSTART:20241215T120000Z\r\n\
DTEND:20241215T130000Z\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse(ics);
        let names: Vec<&str> = events.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Dentist", "Standup", "Holiday"]);

        assert_eq!(events[0].location.as_deref(), Some("12 Main St"));
        assert_eq!(events[1].start, utc(2025, 1, 16, 14, 0, 0), "alias TZID should resolve to New York");
        assert_eq!(events[1].location, None);

        let holiday = &events[2];
        assert_eq!(holiday.start, utc(2025, 1, 20, 0, 0, 0));
        assert_eq!(holiday.end, utc(2025, 1, 20, 23, 59, 59));
        assert!(holiday.is_all_day());
    }

    #[test]
    fn test_floating_time_uses_viewer_zone_and_missing_end() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:floating-1\r\n\
SUMMARY:Coffee\r\n\
DTSTART:20250116T080000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:date-1\r\n\
SUMMARY:Birthday\r\n\
DTSTART;VALUE=DATE:20250118\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse(ics);
        assert_eq!(events.len(), 2);

        assert_eq!(events[0].name, "Coffee");
        assert_eq!(events[0].start, utc(2025, 1, 16, 13, 0, 0));
        assert_eq!(events[0].end, events[0].start);

        assert_eq!(events[1].name, "Birthday");
        assert_eq!(events[1].end, utc(2025, 1, 18, 23, 59, 59));
        assert!(events[1].is_all_day());
    }

    #[test]
    fn test_recurring_event_expanded_with_exdate_and_override() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:daily-1\r\n\
SUMMARY:Team sync\r\n\
DTSTART;TZID=America/New_York:20250106T100000\r\n\
DTEND;TZID=America/New_York:20250106T110000\r\n\
RRULE:FREQ=DAILY;COUNT=30\r\n\
EXDATE;TZID=America/New_York:20250117T100000\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:daily-1\r\n\
RECURRENCE-ID;TZID=America/New_York:20250116T100000\r\n\
SUMMARY:Team sync (moved)\r\n\
DTSTART;TZID=America/New_York:20250116T140000\r\n\
DTEND;TZID=America/New_York:20250116T150000\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse(ics);

        let generated: Vec<&RawEvent> = events.iter().filter(|e| e.name == "Team sync").collect();
        assert_eq!(generated.len(), 6, "Jan 15-22 minus the excluded and moved days");
        assert!(generated.iter().all(|e| e.end - e.start == Duration::hours(1)));
        assert!(!generated.iter().any(|e| e.start == utc(2025, 1, 17, 15, 0, 0)));
        assert!(!generated.iter().any(|e| e.start == utc(2025, 1, 16, 15, 0, 0)));

        let moved: Vec<&RawEvent> = events.iter().filter(|e| e.name == "Team sync (moved)").collect();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].start, utc(2025, 1, 16, 19, 0, 0));
    }

    #[test]
    fn test_recurring_all_day_occurrences_stay_all_day() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:weekly-allday\r\n\
SUMMARY:Trash day\r\n\
DTSTART;VALUE=DATE:20250101\r\n\
DTEND;VALUE=DATE:20250102\r\n\
RRULE:FREQ=WEEKLY;COUNT=10\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse(ics);
        let starts: Vec<DateTime<Utc>> = events.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![utc(2025, 1, 15, 0, 0, 0), utc(2025, 1, 22, 0, 0, 0)]);
        assert!(events.iter().all(RawEvent::is_all_day));
    }

    #[test]
    fn test_all_day_series_with_date_only_until() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:weekly-until\r\n\
SUMMARY:Recycling\r\n\
DTSTART;VALUE=DATE:20250101\r\n\
DTEND;VALUE=DATE:20250102\r\n\
RRULE:FREQ=WEEKLY;UNTIL=20250301\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse(ics);
        let starts: Vec<DateTime<Utc>> = events.iter().map(|e| e.start).collect();
        assert_eq!(starts, vec![utc(2025, 1, 15, 0, 0, 0), utc(2025, 1, 22, 0, 0, 0)]);
        assert!(events.iter().all(RawEvent::is_all_day));
    }

    #[test]
    fn test_zoned_series_with_date_only_until_includes_last_day() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:daily-until\r\n\
SUMMARY:Check-in\r\n\
DTSTART;TZID=America/New_York:20250106T100000\r\n\
DTEND;TZID=America/New_York:20250106T103000\r\n\
RRULE:FREQ=DAILY;UNTIL=20250117\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

        let events = parse(ics);
        let starts: Vec<DateTime<Utc>> = events.iter().map(|e| e.start).collect();
        assert_eq!(
            starts,
            vec![
                utc(2025, 1, 15, 15, 0, 0),
                utc(2025, 1, 16, 15, 0, 0),
                utc(2025, 1, 17, 15, 0, 0),
            ]
        );
    }

    #[test]
    fn test_empty_calendar() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nEND:VCALENDAR\r\n";
        assert!(parse(ics).is_empty());
    }
}
