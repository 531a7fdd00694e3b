use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    store_healthy: bool,
    db_healthy: bool,
}

/// Always 200; the flags report whether each backing store answered.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (store, db) = tokio::join!(state.sessions.health_check(), state.users.health_check());

    if let Err(e) = &store {
        tracing::warn!(error = %e, "Session store health check failed");
    }
    if let Err(e) = &db {
        tracing::warn!(error = %e, "Database health check failed");
    }

    let healthy = store.is_ok() && db.is_ok();
    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store_healthy: store.is_ok(),
        db_healthy: db.is_ok(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
