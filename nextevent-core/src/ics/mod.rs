//! iCalendar input for the selector.

mod parse;
mod recurrence;

pub use parse::parse_calendar;
