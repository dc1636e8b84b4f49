use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::ephemeris::EphemerisError;
use crate::error::GeometryError;
use crate::geo::GeoError;
use crate::grid::GridError;

pub enum ApiError {
    Validation(String),
    NotFound(String),
    Computation(String),
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<GeometryError> for ApiError {
    fn from(e: GeometryError) -> Self {
        match e {
            GeometryError::Geo(geo) => ApiError::Validation(geo.to_string()),
            GeometryError::Ephemeris(eph) => eph.into(),
            other @ GeometryError::NonConvergence { .. } => {
                ApiError::Computation(other.to_string())
            }
        }
    }
}

impl From<EphemerisError> for ApiError {
    fn from(e: EphemerisError) -> Self {
        match e {
            EphemerisError::UnknownBody(body) => ApiError::NotFound(body),
            other => ApiError::Computation(other.to_string()),
        }
    }
}

impl From<GeoError> for ApiError {
    fn from(e: GeoError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<GridError> for ApiError {
    fn from(e: GridError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::with_message("validation_failed", &msg)),
            )
                .into_response(),
            ApiError::NotFound(body) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::with_message("unknown_body", &body)),
            )
                .into_response(),
            ApiError::Computation(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_message("computation_failed", &msg)),
            )
                .into_response(),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::with_message("internal_error", &msg)),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
