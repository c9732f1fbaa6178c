//! Application error type mapping to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use mucbridge_types::error::BridgeError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Bridge(BridgeError),
}

impl From<BridgeError> for AppError {
    fn from(e: BridgeError) -> Self {
        AppError::Bridge(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Bridge(e @ BridgeError::SessionNotFound(_)) => {
                (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND", e.to_string())
            }
            AppError::Bridge(e @ BridgeError::AlreadyAttached(_)) => {
                (StatusCode::CONFLICT, "ALREADY_ATTACHED", e.to_string())
            }
            AppError::Bridge(e @ BridgeError::SessionClosed(_)) => {
                (StatusCode::GONE, "SESSION_CLOSED", e.to_string())
            }
            AppError::Bridge(e @ BridgeError::ChatProtocol(_)) => {
                (StatusCode::BAD_GATEWAY, "CHAT_UNAVAILABLE", e.to_string())
            }
            AppError::Bridge(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "BRIDGE_ERROR", e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = json!({
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
