//! Handlers for the `/auth` resource (register, login, refresh, logout, sessions).

use autoban_core::roles::{Role, Status};
use autoban_core::types::{Timestamp, UserId};
use autoban_db::models::session::Session;
use autoban_db::models::user::User;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::service::TokenPair;
use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireActive;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register` and `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub phone_number: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh-token` and `POST /auth/logout`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in: pair.expires_in,
        }
    }
}

/// Public user info returned by registration.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: UserId,
    pub phone_number: String,
    pub role: Role,
    pub status: Status,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            role: user.role,
            status: user.status,
        }
    }
}

/// One device session as shown to clients. The refresh token is never exposed.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub device_id: String,
    pub last_used: Timestamp,
    pub is_active: bool,
}

impl From<Session> for SessionInfo {
    fn from(session: Session) -> Self {
        Self {
            device_id: session.device_id,
            last_used: session.last_used,
            is_active: session.is_active,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create an account with the `User` role. Returns 201 with the new user.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<UserInfo>)> {
    let user = state
        .auth
        .register(&input.phone_number, &input.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// POST /api/v1/auth/login
///
/// Authenticate with phone number + password. Every login starts a new
/// device session.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<CredentialsRequest>,
) -> AppResult<Json<TokenResponse>> {
    let pair = state
        .auth
        .login(&input.phone_number, &input.password)
        .await?;
    Ok(Json(pair.into()))
}

/// POST /api/v1/auth/refresh-token
///
/// Exchange the current refresh token for a new pair. The presented token
/// stops working once this succeeds.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let pair = state.auth.refresh(&input.refresh_token).await?;
    Ok(Json(pair.into()))
}

/// POST /api/v1/auth/logout
///
/// Revoke the device session named by the refresh token. Returns 204 No Content.
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(input): Json<RefreshRequest>,
) -> AppResult<StatusCode> {
    state
        .auth
        .logout(&input.refresh_token, &auth_user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/logout-all
///
/// Revoke every device session of the caller. Returns 204 No Content.
pub async fn logout_all(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<StatusCode> {
    state.auth.logout_all(&auth_user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/sessions
///
/// List the caller's live device sessions, most recently used first.
pub async fn list_sessions(
    State(state): State<AppState>,
    RequireActive(auth_user): RequireActive,
) -> AppResult<Json<DataResponse<Vec<SessionInfo>>>> {
    let sessions = state.auth.sessions(&auth_user.user_id).await?;
    Ok(Json(DataResponse {
        data: sessions.into_iter().map(SessionInfo::from).collect(),
    }))
}
