//! Router error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Unlike a
//! public API, the caller here is a test, so messages name the session and
//! capability involved to make misconfigured suites easy to diagnose.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use isolator_common::{RegistryError, TokenError};
use serde::Serialize;
use thiserror::Error;

/// Router error type.
///
/// Maps to HTTP status codes:
/// - MissingSession, InvalidSession: 400 Bad Request
/// - LookupMiss: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Missing session cookie '{0}'")]
    MissingSession(String),

    #[error("Invalid session token: {0}")]
    InvalidSession(#[from] TokenError),

    #[error(transparent)]
    LookupMiss(#[from] RegistryError),
}

impl RouterError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RouterError::MissingSession(_) | RouterError::InvalidSession(_) => 400,
            RouterError::LookupMiss(_) => 500,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for RouterError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            RouterError::MissingSession(_) => (StatusCode::BAD_REQUEST, "MISSING_SESSION"),
            RouterError::InvalidSession(_) => (StatusCode::BAD_REQUEST, "INVALID_SESSION"),
            RouterError::LookupMiss(err) => {
                tracing::error!(target: "isolator.router", error = %err, "Mock lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "MOCK_NOT_REGISTERED")
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use isolator_common::{CapabilityId, SessionToken};

    trait Inventory {}

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_session_is_bad_request() {
        let error = RouterError::MissingSession("mock_session".to_string());
        assert_eq!(error.status_code(), 400);

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MISSING_SESSION");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("mock_session"));
    }

    #[tokio::test]
    async fn test_invalid_session_is_bad_request() {
        let response = RouterError::from(TokenError::Empty).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_SESSION");
    }

    #[tokio::test]
    async fn test_lookup_miss_is_server_error_naming_capability() {
        let error = RouterError::from(RegistryError::LookupMiss {
            token: SessionToken::parse("tokA").unwrap(),
            capability: CapabilityId::of::<dyn Inventory>(),
        });
        assert_eq!(error.status_code(), 500);

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "MOCK_NOT_REGISTERED");
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("Inventory"), "got {message}");
        assert!(message.contains("tokA"), "got {message}");
    }
}
