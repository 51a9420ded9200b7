//! JSON response rendering and the error envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Message used when an error carries no text of its own.
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Body of every handler-signaled error: `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    /// Blank messages are replaced with [`UNKNOWN_ERROR`].
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let error = if message.trim().is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            message
        };
        Self { error }
    }
}

/// Serialize `value` as JSON with `status`.
pub fn json<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(value)).into_response()
}

/// Error envelope with `status`.
pub fn error(status: StatusCode, message: impl Into<String>) -> Response {
    json(status, ErrorResponse::new(message))
}

/// Error envelope for an optional error value.
pub fn failure(status: StatusCode, err: Option<&dyn std::error::Error>) -> Response {
    let message = err.map(ToString::to_string).unwrap_or_default();
    error(status, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let response = error(StatusCode::BAD_REQUEST, "missing fnId");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_of(response).await,
            serde_json::json!({"error": "missing fnId"})
        );
    }

    #[tokio::test]
    async fn test_absent_error_becomes_unknown() {
        let response = failure(StatusCode::INTERNAL_SERVER_ERROR, None);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_of(response).await,
            serde_json::json!({"error": "unknown error"})
        );
        assert_eq!(ErrorResponse::new("  ").error, UNKNOWN_ERROR);
    }
}
