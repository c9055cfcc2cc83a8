//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use thermodiff_domain::error::{ConfigurationError, NotFoundError, ThermodiffError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`ThermodiffError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(ThermodiffError);

impl From<ThermodiffError> for ApiError {
    fn from(err: ThermodiffError) -> Self {
        Self(err)
    }
}

impl From<NotFoundError> for ApiError {
    fn from(err: NotFoundError) -> Self {
        Self(err.into())
    }
}

impl From<ConfigurationError> for ApiError {
    fn from(err: ConfigurationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            ThermodiffError::Configuration(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            ThermodiffError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            ThermodiffError::Unavailable(err) => {
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            ThermodiffError::Command(err) => {
                tracing::error!(error = %err, "command error");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            ThermodiffError::Adapter(err) => {
                tracing::error!(error = %err, "adapter error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
