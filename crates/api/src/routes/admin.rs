//! Route definitions for the `/admin` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. All require the admin role.
///
/// ```text
/// GET    /users/{id}/sessions -> list_user_sessions
/// DELETE /users/{id}/sessions -> revoke_user_sessions
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/users/{id}/sessions",
        get(admin::list_user_sessions).delete(admin::revoke_user_sessions),
    )
}
