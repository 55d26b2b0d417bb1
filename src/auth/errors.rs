//! Authentication Errors
//! Mission: One error taxonomy at the HTTP boundary, opaque 500s

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Errors surfaced to clients by the auth flows and middleware.
///
/// `InvalidCredentials` is deliberately shared between "no such user" and
/// "wrong password"; `Unauthenticated` is shared between missing, expired
/// and invalid tokens. Neither leaks which case occurred.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed input (400). Carries the message shown to the client.
    Validation(String),
    /// Duplicate email on registration (400).
    Conflict,
    /// Wrong email or password on login (401).
    InvalidCredentials,
    /// Missing/expired/invalid token, or the account no longer exists (401).
    Unauthenticated,
    /// Authenticated but the role is not allowed for this route (403).
    Forbidden,
    /// Anything internal (500). Detail stays in the server log.
    Internal,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Conflict => (StatusCode::BAD_REQUEST, "User already exists".to_string()),
            ApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "Not authorized to access this route".to_string(),
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions".to_string()),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (_, message) = self.status_and_message();
        write!(f, "{}", message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let body = json!({
            "success": false,
            "error": message,
        });
        (status, Json(body)).into_response()
    }
}

/// Store-level failures. The only case flows need to distinguish is the
/// unique-email violation, which resolves the register race.
#[derive(Debug)]
pub enum StoreError {
    DuplicateEmail,
    Backend(anyhow::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::DuplicateEmail => write!(f, "email already registered"),
            StoreError::Backend(e) => write!(f, "store failure: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = &e {
            if inner.code == rusqlite::ErrorCode::ConstraintViolation {
                return StoreError::DuplicateEmail;
            }
        }
        StoreError::Backend(e.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => ApiError::Conflict,
            StoreError::Backend(err) => {
                // Full detail server-side only; the client sees "Server error".
                error!("store failure: {:#}", err);
                ApiError::Internal
            }
        }
    }
}
