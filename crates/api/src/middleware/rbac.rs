//! Role and status checks layered on [`AuthUser`].
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose claims do not
//! meet the requirement, so authorization is enforced at the type level.

use autoban_core::error::CoreError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `Admin` or `SuperAdmin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires an `Active` account. Rejects with 403 Forbidden otherwise.
pub struct RequireActive(pub AuthUser);

impl FromRequestParts<AppState> for RequireActive {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.status.is_active() {
            return Err(AppError::Core(CoreError::Forbidden(format!(
                "Account is {}",
                user.status.name()
            ))));
        }
        Ok(RequireActive(user))
    }
}
