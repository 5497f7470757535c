use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tokengate_core::error::CoreError;
use tokengate_db::StoreError;

use crate::auth::jwt::TokenError;
use crate::auth::password::CredentialError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`StoreError`] for persistence
/// failures, and adds HTTP-specific variants. Implements [`IntoResponse`] to
/// produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `tokengate_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A failure reported by the user store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match &err {
            TokenError::InvalidSignature | TokenError::Expired => {
                AppError::Core(CoreError::Unauthorized(err.to_string()))
            }
            TokenError::Signing(_) | TokenError::ExpiryOutOfRange(_) => {
                AppError::InternalError(format!("Token generation error: {err}"))
            }
        }
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match &err {
            CredentialError::Mismatch => AppError::Core(CoreError::Unauthorized(err.to_string())),
            CredentialError::Hashing(e) => {
                AppError::InternalError(format!("Password hashing error: {e}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound {
                    entity,
                    field,
                    value,
                } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with {field} {value} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            },

            // --- Store errors ---
            AppError::Store(err) => classify_store_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a store error into an HTTP status, error code, and message.
///
/// - Uniqueness violations map to 409.
/// - A vanished user maps to 404.
/// - Everything else maps to 500 with a sanitized message.
fn classify_store_error(err: &StoreError) -> (StatusCode, &'static str, String) {
    match err {
        StoreError::Duplicate { field } => {
            let message = match *field {
                "email" => "this email already exists",
                "phone" => "this phone number already exists",
                _ => "this user already exists",
            };
            (StatusCode::CONFLICT, "CONFLICT", message.to_string())
        }
        StoreError::UnknownUser(user_id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("User with user_id {user_id} not found"),
        ),
        other => {
            tracing::error!(error = %other, "Store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
