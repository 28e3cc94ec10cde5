//! Viewer display preferences.

use serde::{Deserialize, Serialize};

/// Which events count as "next" for a viewer.
///
/// An unset flag is not the same as `false`: `include_all_day` and
/// `show_in_progress` default to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub include_all_day: bool,
    pub only_all_day: bool,
    pub show_in_progress: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            include_all_day: true,
            only_all_day: false,
            show_in_progress: true,
        }
    }
}

impl DisplayOptions {
    /// Build options from optional request flags, filling gaps with defaults.
    pub fn from_flags(
        include_all_day: Option<bool>,
        only_all_day: Option<bool>,
        show_in_progress: Option<bool>,
    ) -> Self {
        let defaults = DisplayOptions::default();
        DisplayOptions {
            include_all_day: include_all_day.unwrap_or(defaults.include_all_day),
            only_all_day: only_all_day.unwrap_or(defaults.only_all_day),
            show_in_progress: show_in_progress.unwrap_or(defaults.show_in_progress),
        }
    }
}
