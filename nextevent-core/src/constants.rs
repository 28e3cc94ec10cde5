pub const SECONDS_PER_DAY: i64 = 86_400;

/// Days fetched before now so multi-day all-day events that started
/// yesterday are still seen.
pub const DEFAULT_LOOK_BACK_DAYS: i64 = 1;

pub const DEFAULT_LOOK_AHEAD_DAYS: i64 = 7;

/// Upper bound on generated occurrences per recurring event.
pub const MAX_RECURRENCE_INSTANCES: u16 = 366;
