//! Errors returned by the A2A HTTP surface

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::protocol::ErrorResponse;

#[derive(Debug, Error)]
pub enum A2aError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Missing or invalid bearer token")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl A2aError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::TaskNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for A2aError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
