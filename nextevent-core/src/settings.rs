//! Layered configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::constants::{DEFAULT_LOOK_AHEAD_DAYS, DEFAULT_LOOK_BACK_DAYS};
use crate::error::{NextEventError, NextEventResult};
use crate::window::FetchWindow;
use crate::zone::{ZoneAlias, ZoneAliases, ZoneResolver};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_fetch_timeout() -> String {
    "10s".to_string()
}

fn default_look_back_days() -> i64 {
    DEFAULT_LOOK_BACK_DAYS
}

fn default_look_ahead_days() -> i64 {
    DEFAULT_LOOK_AHEAD_DAYS
}

/// Settings from ~/.config/nextevent/config.toml, overridden by
/// `NEXTEVENT_*` environment variables.
///
/// `zone_aliases` entries are added on top of the built-in Windows table.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// humantime duration, e.g. "10s" or "1m 30s"
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: String,

    #[serde(default = "default_look_back_days")]
    pub look_back_days: i64,

    #[serde(default = "default_look_ahead_days")]
    pub look_ahead_days: i64,

    #[serde(default)]
    pub zone_aliases: Vec<ZoneAlias>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: default_host(),
            port: default_port(),
            fetch_timeout: default_fetch_timeout(),
            look_back_days: default_look_back_days(),
            look_ahead_days: default_look_ahead_days(),
            zone_aliases: Vec::new(),
        }
    }
}

impl Settings {
    pub fn config_path() -> NextEventResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NextEventError::Config("Could not determine config directory".into()))?
            .join("nextevent");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path` (or the default location). A missing file is fine.
    pub fn load(path: Option<&Path>) -> NextEventResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("NEXTEVENT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| NextEventError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| NextEventError::Config(e.to_string()))
    }

    pub fn fetch_timeout(&self) -> NextEventResult<Duration> {
        humantime::parse_duration(&self.fetch_timeout).map_err(|e| {
            NextEventError::Config(format!("Invalid fetch_timeout '{}': {e}", self.fetch_timeout))
        })
    }

    /// A misconfigured alias is a startup error, not a per-request one.
    pub fn resolver(&self) -> NextEventResult<ZoneResolver> {
        let aliases = ZoneAliases::with_overrides(&self.zone_aliases)?;
        Ok(ZoneResolver::new(aliases))
    }

    pub fn window(&self, now: DateTime<Utc>) -> FetchWindow {
        FetchWindow::with_days(now, self.look_back_days, self.look_ahead_days)
    }
}
