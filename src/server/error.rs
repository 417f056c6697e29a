//! HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::error::PipelineError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// An error with the status it is reported under
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match &err {
            PipelineError::AlreadyProcessed(_) | PipelineError::Validation(_) => StatusCode::BAD_REQUEST,
            PipelineError::NotFound { .. } => StatusCode::NOT_FOUND,
            PipelineError::GenerationFailure(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if !err.is_client_error() {
            error!(%status, "Request failed: {}", err);
        }

        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Malformed or mistyped JSON bodies are client errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::core::SafetyViolation;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PipelineError::AlreadyProcessed(Uuid::nil()), StatusCode::BAD_REQUEST),
            (PipelineError::Validation(SafetyViolation::EmptyPrompt), StatusCode::BAD_REQUEST),
            (PipelineError::not_found("Published content", 1), StatusCode::NOT_FOUND),
            (PipelineError::GenerationFailure("timeout".to_string()), StatusCode::BAD_GATEWAY),
            (PipelineError::Server("boom".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status, expected);
        }
    }
}
