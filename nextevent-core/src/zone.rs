//! Time zone resolution.
//!
//! Calendar feeds (Outlook/Exchange in particular) often name zones the
//! Windows way, e.g. `TZID:Eastern Standard Time`. Those names are mapped to
//! IANA zones through a [`ZoneAliases`] table that callers pass in; anything
//! not in the table is parsed as an IANA identifier directly.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ZoneError;

/// Windows display names seen in the wild, and the IANA zone they mean.
pub const WINDOWS_ZONE_ALIASES: &[(&str, &str)] = &[
    ("Hawaii Standard Time", "Pacific/Honolulu"),
    ("Alaskan Standard Time", "America/Anchorage"),
    ("Alaskan Daylight Time", "America/Anchorage"),
    ("SA Pacific Standard Time", "America/Bogota"),
    ("Pacific Standard Time", "America/Los_Angeles"),
    ("Pacific Daylight Time", "America/Los_Angeles"),
    ("Central Standard Time", "America/Chicago"),
    ("Central Daylight Time", "America/Chicago"),
    ("Mountain Standard Time", "America/Denver"),
    ("Mountain Daylight Time", "America/Denver"),
    ("Eastern Standard Time", "America/New_York"),
    ("Eastern Daylight Time", "America/New_York"),
];

/// One alias entry as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneAlias {
    pub name: String,
    pub zone: String,
}

/// Validated alias table: non-IANA name -> IANA zone.
#[derive(Debug, Clone)]
pub struct ZoneAliases {
    map: HashMap<String, Tz>,
}

impl Default for ZoneAliases {
    fn default() -> Self {
        ZoneAliases::from_pairs(WINDOWS_ZONE_ALIASES.iter().copied())
            .expect("built-in zone aliases are valid IANA zones")
    }
}

impl ZoneAliases {
    pub fn empty() -> Self {
        ZoneAliases {
            map: HashMap::new(),
        }
    }

    /// Build a table, failing on the first alias whose target is not a known
    /// IANA zone.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ZoneError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut map = HashMap::new();
        for (alias, target) in pairs {
            let alias = alias.into();
            let tz: Tz = target.as_ref().parse().map_err(|_| ZoneError::InvalidAlias {
                alias: alias.clone(),
                target: target.as_ref().to_string(),
            })?;
            map.insert(alias, tz);
        }
        Ok(ZoneAliases { map })
    }

    /// The built-in Windows table with `extra` entries layered on top.
    pub fn with_overrides(extra: &[ZoneAlias]) -> Result<Self, ZoneError> {
        let mut aliases = ZoneAliases::default();
        let overrides =
            ZoneAliases::from_pairs(extra.iter().map(|a| (a.name.clone(), a.zone.as_str())))?;
        aliases.map.extend(overrides.map);
        Ok(aliases)
    }

    pub fn get(&self, name: &str) -> Option<Tz> {
        self.map.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Looks up zones and their current UTC offset.
pub trait OffsetResolver {
    fn resolve(&self, zone: &str) -> Result<Tz, ZoneError>;

    /// Offset from UTC in seconds at `at`, standard or daylight.
    fn utc_offset(&self, tz: Tz, at: DateTime<Utc>) -> Result<i32, ZoneError> {
        Ok(offset_seconds(tz, at))
    }
}

/// Alias table first, then the IANA database bundled by chrono-tz.
#[derive(Debug, Clone, Default)]
pub struct ZoneResolver {
    aliases: ZoneAliases,
}

impl ZoneResolver {
    pub fn new(aliases: ZoneAliases) -> Self {
        ZoneResolver { aliases }
    }

    pub fn aliases(&self) -> &ZoneAliases {
        &self.aliases
    }
}

impl OffsetResolver for ZoneResolver {
    fn resolve(&self, zone: &str) -> Result<Tz, ZoneError> {
        if let Some(tz) = self.aliases.get(zone) {
            return Ok(tz);
        }
        zone.parse::<Tz>()
            .map_err(|_| ZoneError::Unknown(zone.to_string()))
    }
}

pub fn offset_seconds(tz: Tz, at: DateTime<Utc>) -> i32 {
    tz.offset_from_utc_datetime(&at.naive_utc())
        .fix()
        .local_minus_utc()
}

/// Resolve a wall-clock time in `tz` to an instant.
///
/// Ambiguous times (DST fall-back) take the earlier instant. Times inside a
/// DST gap are moved forward by an hour, the way clocks jump.
pub fn local_to_utc(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_builtin_aliases_are_valid() {
        let aliases = ZoneAliases::default();
        assert_eq!(aliases.len(), WINDOWS_ZONE_ALIASES.len());
        assert_eq!(aliases.get("Eastern Standard Time"), Some(Tz::America__New_York));
        assert_eq!(aliases.get("Hawaii Standard Time"), Some(Tz::Pacific__Honolulu));
    }

    #[test]
    fn test_invalid_alias_target_is_rejected() {
        let err = ZoneAliases::from_pairs([("Moon Standard Time", "Moon/Tranquility")]).unwrap_err();
        assert_eq!(
            err,
            ZoneError::InvalidAlias {
                alias: "Moon Standard Time".into(),
                target: "Moon/Tranquility".into(),
            }
        );
    }

    #[test]
    fn test_overrides_extend_builtin_table() {
        let aliases = ZoneAliases::with_overrides(&[ZoneAlias {
            name: "W. Europe Standard Time".into(),
            zone: "Europe/Berlin".into(),
        }])
        .unwrap();

        assert_eq!(aliases.get("W. Europe Standard Time"), Some(Tz::Europe__Berlin));
        assert_eq!(aliases.get("Pacific Standard Time"), Some(Tz::America__Los_Angeles));
    }

    #[test]
    fn test_resolver_prefers_alias_then_iana() {
        let resolver = ZoneResolver::default();
        assert_eq!(resolver.resolve("Central Daylight Time").unwrap(), Tz::America__Chicago);
        assert_eq!(resolver.resolve("Europe/Paris").unwrap(), Tz::Europe__Paris);
        assert_eq!(
            resolver.resolve("Not/AZone").unwrap_err(),
            ZoneError::Unknown("Not/AZone".into())
        );
    }

    #[test]
    fn test_empty_aliases_fall_through_to_iana() {
        let resolver = ZoneResolver::new(ZoneAliases::empty());
        assert!(resolver.resolve("Eastern Standard Time").is_err());
        assert!(resolver.resolve("America/New_York").is_ok());
    }

    #[test]
    fn test_utc_offset_follows_daylight_saving() {
        let resolver = ZoneResolver::default();
        let winter = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
        let summer = Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap();

        let new_york = resolver.resolve("Eastern Standard Time").unwrap();

        assert_eq!(resolver.utc_offset(new_york, winter).unwrap(), -5 * 3600);
        assert_eq!(resolver.utc_offset(new_york, summer).unwrap(), -4 * 3600);
        assert_eq!(resolver.utc_offset(Tz::Asia__Kolkata, winter).unwrap(), 5 * 3600 + 1800);
        assert_eq!(resolver.utc_offset(Tz::UTC, summer).unwrap(), 0);
    }

    #[test]
    fn test_local_to_utc_handles_dst_gap() {
        // 2025-03-09 02:30 does not exist in New York.
        let gap = NaiveDate::from_ymd_opt(2025, 3, 9)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        let resolved = local_to_utc(Tz::America__New_York, gap).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2025, 3, 9, 7, 30, 0).unwrap());
    }
}
