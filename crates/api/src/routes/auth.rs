//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register       -> register
/// POST /login          -> login
/// POST /refresh-token  -> refresh
/// POST /logout         -> logout (requires auth)
/// POST /logout-all     -> logout_all (requires auth)
/// GET  /sessions       -> list_sessions (requires active account)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh-token", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
        .route("/sessions", get(auth::list_sessions))
}
