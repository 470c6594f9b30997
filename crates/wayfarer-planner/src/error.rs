//! Planner errors and their HTTP mapping

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

use wayfarer_a2a::protocol::ErrorResponse;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Weather data not found for {0}")]
    NotFound(String),

    #[error("Weather service unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("Reasoning backend failed: {0:#}")]
    Decider(anyhow::Error),
}

impl PlannerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::WeatherUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Decider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PlannerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
