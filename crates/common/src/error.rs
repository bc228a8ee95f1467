use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to webhook callers.
///
/// Delivery failures never appear here: an alert is acknowledged as soon as
/// it is queued.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No data received")]
    EmptyPayload,

    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::EmptyPayload => StatusCode::BAD_REQUEST,
            AppError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        };

        let body = json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_is_bad_request() {
        let response = AppError::EmptyPayload.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_invalid_payload_message() {
        let err = AppError::InvalidPayload("expected value at line 1 column 1".into());
        assert_eq!(
            err.to_string(),
            "Invalid JSON payload: expected value at line 1 column 1"
        );
    }
}
