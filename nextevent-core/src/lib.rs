//! Core library for nextevent.
//!
//! Picks the single "next relevant event" out of a week of calendar events
//! for display on a small device:
//! - `selector` runs the selection pipeline (all-day correction, option
//!   filtering, in-progress ordering, look-back skip, display facts)
//! - `zone` resolves IANA zones and Windows-style aliases
//! - `ics` turns an iCalendar feed into raw events inside the fetch window
//! - `settings` loads the layered configuration

pub mod constants;
pub mod error;
pub mod event;
pub mod ics;
pub mod options;
pub mod selector;
pub mod settings;
pub mod window;
pub mod zone;

pub use error::{NextEventError, NextEventResult, SelectError, ZoneError};
pub use event::{Event, RawEvent};
pub use options::DisplayOptions;
pub use selector::{Detail, EventSelector, SelectionResult};
pub use settings::Settings;
pub use window::FetchWindow;
pub use zone::{OffsetResolver, ZoneAliases, ZoneResolver};
