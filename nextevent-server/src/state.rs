use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use url::Url;

use nextevent_core::ics::parse_calendar;
use nextevent_core::{DisplayOptions, EventSelector, OffsetResolver, Settings, ZoneResolver};

use crate::fetch::IcsClient;
use crate::routes::ApiError;
use crate::routes::next_event::BaseResponse;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
    selector: Arc<EventSelector<ZoneResolver>>,
    client: IcsClient,
}

impl AppState {
    /// Fails on configuration errors (bad zone aliases, bad timeout).
    pub fn new(settings: Settings) -> Result<Self> {
        let resolver = settings.resolver()?;
        let client = IcsClient::new(settings.fetch_timeout()?)?;

        Ok(AppState {
            settings: Arc::new(settings),
            selector: Arc::new(EventSelector::new(resolver)),
            client,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Resolve the viewer zone once per request, before any download happens.
    pub fn zone(&self, tz: &str) -> Result<Tz, ApiError> {
        self.selector
            .resolver()
            .resolve(tz)
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    }

    pub async fn download(&self, url: &Url) -> Result<String, ApiError> {
        self.client
            .download(url)
            .await
            .map_err(|e| ApiError::BadGateway(format!("{e:#}")))
    }

    /// Parse a feed and pick the next event for a viewer in `viewer`.
    ///
    /// "Nothing to show" is a successful, empty response.
    pub fn respond(
        &self,
        content: &str,
        viewer: Tz,
        options: &DisplayOptions,
        now: DateTime<Utc>,
    ) -> Result<BaseResponse, ApiError> {
        let window = self.settings.window(now);
        let events = parse_calendar(content, viewer, &window, self.selector.resolver())
            .map_err(|e| ApiError::BadGateway(e.to_string()))?;

        match self.selector.select_in(events, viewer, now, options) {
            Ok(selection) => Ok(BaseResponse::found(selection)),
            Err(e) if e.is_no_event() => {
                tracing::info!(reason = %e, "no next event");
                Ok(BaseResponse::empty())
            }
            Err(e) => Err(ApiError::BadRequest(e.to_string())),
        }
    }
}
