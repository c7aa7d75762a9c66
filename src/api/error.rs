//! API error responses

use crate::api::reader::ReadError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ReadError> for ApiError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::InvalidCursor(e) => ApiError::BadRequest(e.to_string()),
            ReadError::Storage(e) => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Store details stay in the log
        let error = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Failed to fetch videos");
                "Failed to fetch videos".to_string()
            }
            ApiError::BadRequest(detail) => detail.clone(),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
