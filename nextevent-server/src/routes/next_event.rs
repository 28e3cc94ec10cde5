//! Next event endpoint

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use nextevent_core::{Detail, DisplayOptions, SelectionResult};

use crate::fetch::feed_url;
use crate::routes::{ApiError, ErrorResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/next-event", post(next_event))
}

/// Request body. The display flags are optional; an absent flag means its
/// default, not `false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextEventRequest {
    pub ics_url: String,
    pub tz: String,
    #[serde(default)]
    pub show_in_progress: Option<bool>,
    #[serde(default)]
    pub include_all_day_events: Option<bool>,
    #[serde(default)]
    pub only_show_all_day_events: Option<bool>,
}

impl NextEventRequest {
    pub fn options(&self) -> DisplayOptions {
        DisplayOptions::from_flags(
            self.include_all_day_events,
            self.only_show_all_day_events,
            self.show_in_progress,
        )
    }
}

/// Response envelope: `data` is null when there is nothing to show.
#[derive(Debug, Serialize, Deserialize)]
pub struct BaseResponse {
    pub data: Option<NextEvent>,
    pub message: Option<ErrorResponse>,
}

impl BaseResponse {
    pub fn found(selection: SelectionResult) -> Self {
        BaseResponse {
            data: Some(NextEvent::from(selection)),
            message: None,
        }
    }

    pub fn empty() -> Self {
        BaseResponse {
            data: None,
            message: None,
        }
    }

    pub fn error(message: String) -> Self {
        BaseResponse {
            data: None,
            message: Some(ErrorResponse {
                error: true,
                message,
            }),
        }
    }
}

/// Start and end are unix seconds, already shifted for all-day events.
#[derive(Debug, Serialize, Deserialize)]
pub struct NextEvent {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub location: Option<String>,
    pub detail: EventDetail,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub is_today: bool,
    pub is_tomorrow: bool,
    pub is_this_week: bool,
    pub minutes_until_start: i64,
    pub minutes_until_end: i64,
    pub hours_to_end: i64,
    pub in_progress: bool,
    pub is_all_day: bool,
}

impl From<Detail> for EventDetail {
    fn from(detail: Detail) -> Self {
        EventDetail {
            is_today: detail.is_today,
            is_tomorrow: detail.is_tomorrow,
            is_this_week: detail.is_this_week,
            minutes_until_start: detail.minutes_until_start,
            minutes_until_end: detail.minutes_until_end,
            hours_to_end: detail.hours_until_end,
            in_progress: detail.in_progress,
            is_all_day: detail.is_all_day,
        }
    }
}

impl From<SelectionResult> for NextEvent {
    fn from(selection: SelectionResult) -> Self {
        let SelectionResult { event, detail } = selection;
        NextEvent {
            name: event.name,
            start: event.start.timestamp(),
            end: event.end.timestamp(),
            location: event.location,
            detail: detail.into(),
        }
    }
}

/// POST /next-event - Download a feed and return the next event to show
async fn next_event(
    State(state): State<AppState>,
    payload: Result<Json<NextEventRequest>, JsonRejection>,
) -> Result<Json<BaseResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let url = feed_url(&req.ics_url).map_err(ApiError::BadRequest)?;
    let viewer = state.zone(&req.tz)?;

    let content = state.download(&url).await?;
    let response = state.respond(&content, viewer, &req.options(), Utc::now())?;

    Ok(Json(response))
}
