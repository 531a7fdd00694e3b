//! Admin-only session management for arbitrary users.

use autoban_core::types::UserId;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::auth::SessionInfo;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/users/{id}/sessions
pub async fn list_user_sessions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<UserId>,
) -> AppResult<Json<DataResponse<Vec<SessionInfo>>>> {
    let sessions = state.auth.sessions(&user_id.to_string()).await?;
    Ok(Json(DataResponse {
        data: sessions.into_iter().map(SessionInfo::from).collect(),
    }))
}

/// DELETE /api/v1/admin/users/{id}/sessions
///
/// Force-logout the user from every device. Returns 204 No Content.
pub async fn revoke_user_sessions(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<UserId>,
) -> AppResult<StatusCode> {
    let removed = state.auth.logout_all(&user_id.to_string()).await?;
    tracing::info!(
        admin_id = %admin.user_id,
        user_id = %user_id,
        removed,
        "Admin revoked user sessions"
    );
    Ok(StatusCode::NO_CONTENT)
}
