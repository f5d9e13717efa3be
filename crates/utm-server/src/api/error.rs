//! Error responses: a status code and a `{"error": ...}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use utm_core::DecisionError;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!("Request failed: {:#}", err);
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<DecisionError> for ApiError {
    fn from(err: DecisionError) -> Self {
        match err {
            DecisionError::InvalidInput(_) => Self::bad_request(err.to_string()),
            DecisionError::UpstreamUnavailable(_) => {
                tracing::error!("Flight decision failed: {}", err);
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
