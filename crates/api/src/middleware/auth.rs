//! Access-token authentication extractor for Axum handlers.

use autoban_core::error::AuthError;
use autoban_core::roles::{Role, Status};
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from a Bearer access token in the
/// `Authorization` header.
///
/// Access tokens are trusted on their signature alone; the session store is
/// not consulted.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// String form of the user's UUID (from `claims.user_id`).
    pub user_id: String,
    pub role: Role,
    pub phone_number: String,
    pub status: Status,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::TokenMissing)?;
        let claims = state.auth.codec().decode_access(token)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            role: claims.role,
            phone_number: claims.phone_number,
            status: claims.status,
        })
    }
}

/// The token after `Bearer ` in the `Authorization` header, if any.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
