use std::sync::Arc;

use autoban_db::repositories::{SessionRepo, UserRepo};

use crate::auth::service::AuthService;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Login / refresh / logout orchestration.
    pub auth: Arc<AuthService>,
    /// Session store (also probed by the health check).
    pub sessions: Arc<dyn SessionRepo>,
    /// User repository (also probed by the health check).
    pub users: Arc<dyn UserRepo>,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        sessions: Arc<dyn SessionRepo>,
        users: Arc<dyn UserRepo>,
    ) -> Self {
        let auth = AuthService::new(&config.jwt, Arc::clone(&sessions), Arc::clone(&users));
        Self {
            config: Arc::new(config),
            auth: Arc::new(auth),
            sessions,
            users,
        }
    }
}
