//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use stagehand_domain::error::{StagehandError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`StagehandError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(StagehandError);

impl From<StagehandError> for ApiError {
    fn from(err: StagehandError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            StagehandError::Validation(ValidationError::DuplicateRule(id)) => (
                StatusCode::CONFLICT,
                ValidationError::DuplicateRule(*id).to_string(),
            ),
            StagehandError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            StagehandError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            StagehandError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
