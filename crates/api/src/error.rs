use autoban_core::error::{AuthError, CoreError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Message returned for every rejected token or session, whatever the cause.
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`AuthError`] and adds a catch-all internal
/// variant. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `autoban_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A login / refresh / logout failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            },

            // --- Auth protocol errors ---
            AppError::Auth(auth) => classify_auth_error(auth),

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal()
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify an [`AuthError`] into an HTTP status, error code, and message.
///
/// - Every token or session rejection maps to the same 401 body.
/// - Wrong credentials map to 401 with a distinct code.
/// - Store and signing failures map to 500 with a sanitized message.
fn classify_auth_error(err: &AuthError) -> (StatusCode, &'static str, String) {
    match err {
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "INVALID_CREDENTIALS",
            err.to_string(),
        ),
        // Logged with full detail where they are raised.
        AuthError::StoreUnavailable(_) | AuthError::TokenIssue(_) => internal(),
        rejected => {
            tracing::debug!(reason = %rejected, "Token rejected");
            (
                StatusCode::UNAUTHORIZED,
                "INVALID_TOKEN",
                INVALID_TOKEN_MESSAGE.to_string(),
            )
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
