pub mod health;
pub mod next_event;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::routes::next_event::BaseResponse;

/// Error body inside the response envelope
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: bool,
    pub message: String,
}

/// Failures that reach the client. "No event" outcomes are not errors and
/// never show up here.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad input: unreadable body, malformed URL, unresolvable time zone.
    #[error("{0}")]
    BadRequest(String),

    /// The calendar could not be downloaded or parsed.
    #[error("{0}")]
    BadGateway(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(status = %self.status(), error = %self, "request failed");
        let body = Json(BaseResponse::error(self.to_string()));
        (self.status(), body).into_response()
    }
}
