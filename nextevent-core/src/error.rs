//! Error types for nextevent.

use thiserror::Error;

/// Outcomes of a selection call that did not produce an event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("Unknown time zone: {0}")]
    UnknownZone(String),

    /// Never returned from [`crate::selector::EventSelector::select`]; it is
    /// logged and the all-day correction continues with a UTC offset.
    #[error("Offset lookup failed, using UTC: {0}")]
    OffsetResolutionDegraded(String),

    #[error("No events left after filtering")]
    NoEventsAfterFilter,

    #[error("No events supplied")]
    EmptyInput,
}

impl SelectError {
    /// True for the outcomes that mean "nothing to show" rather than a failure.
    pub fn is_no_event(&self) -> bool {
        matches!(self, SelectError::NoEventsAfterFilter | SelectError::EmptyInput)
    }
}

/// Errors from time zone lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    #[error("Unknown time zone: {0}")]
    Unknown(String),

    #[error("Zone alias '{alias}' points to unknown zone '{target}'")]
    InvalidAlias { alias: String, target: String },
}

/// Errors that can occur outside of selection (configuration, ICS input).
#[derive(Error, Debug)]
pub enum NextEventError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Recurrence error: {0}")]
    Recurrence(String),
}

/// Result type alias for nextevent operations.
pub type NextEventResult<T> = Result<T, NextEventError>;
