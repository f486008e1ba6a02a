use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::tracker::{CatalogError, TrackerError};
use crate::web::auth::PermissionError;

#[derive(Debug)]
pub enum ApiError {
    Permission(PermissionError),
    Validation(String),
    NotFound(String),
    Conflict(&'static str),
    Internal(String),
}

impl From<PermissionError> for ApiError {
    fn from(e: PermissionError) -> Self {
        ApiError::Permission(e)
    }
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        match e {
            TrackerError::AlreadyRunning => ApiError::Conflict("tracker_running"),
            TrackerError::NoSession => ApiError::Conflict("no_satellite_selected"),
            TrackerError::UnknownSatellite(_)
            | TrackerError::NoPass(_)
            | TrackerError::Catalog(CatalogError::NotFound(_)) => ApiError::NotFound(e.to_string()),
            TrackerError::Catalog(CatalogError::NoMainTransponder(_))
            | TrackerError::Catalog(CatalogError::Invalid { .. }) => {
                ApiError::Validation(e.to_string())
            }
            TrackerError::Catalog(CatalogError::FileRead(_)) | TrackerError::Predict(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Permission(e) => e.into_response(),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::with_message("not_found", &msg)),
            )
                .into_response(),
            ApiError::Conflict(reason) => {
                (StatusCode::CONFLICT, Json(ErrorResponse::new(reason))).into_response()
            }
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_message("internal_error", &msg)),
            )
                .into_response(),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
