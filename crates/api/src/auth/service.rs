//! The login / refresh / logout protocol.
//!
//! [`AuthService`] composes the token codec, the session store and the user
//! repository. It holds no mutable state of its own; every call is a short
//! sequence of store round-trips, and a store failure is always surfaced as
//! [`AuthError::StoreUnavailable`] rather than treated as a pass.
//!
//! Refresh tokens are single-use: the presented token must equal the one
//! stored on the session, and the rotated session is written with a
//! compare-and-replace so two concurrent refreshes with the same token cannot
//! both succeed.

use std::sync::Arc;
use std::time::Duration;

use autoban_core::error::{AuthError, CoreError};
use autoban_core::roles::{Role, Status};
use autoban_core::validation::validate_phone_number;
use autoban_db::error::StoreError;
use autoban_db::models::session::Session;
use autoban_db::models::user::{CreateUser, User};
use autoban_db::repositories::{SessionRepo, UserRepo};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::auth::device::new_device_id;
use crate::auth::jwt::{JwtConfig, TokenCodec};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};

/// Freshly issued credentials.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// Orchestrates authentication against the session store.
#[derive(Clone)]
pub struct AuthService {
    codec: TokenCodec,
    sessions: Arc<dyn SessionRepo>,
    users: Arc<dyn UserRepo>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(
        config: &JwtConfig,
        sessions: Arc<dyn SessionRepo>,
        users: Arc<dyn UserRepo>,
    ) -> Self {
        Self {
            codec: TokenCodec::new(config),
            sessions,
            users,
            session_ttl: config.refresh_ttl().to_std().unwrap_or_default(),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Storage lifetime given to every saved or rotated session.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Create an active `User` account.
    pub async fn register(&self, phone_number: &str, password: &str) -> AppResult<User> {
        validate_phone_number(phone_number)?;
        validate_password_strength(password).map_err(CoreError::Validation)?;

        let password_hash = hash_password(password)
            .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

        let input = CreateUser {
            phone_number: phone_number.to_string(),
            password_hash,
            role: Role::User,
            status: Status::Active,
        };
        let user = self.users.create(&input).await.map_err(|e| match e {
            StoreError::Conflict(msg) => AppError::Core(CoreError::Conflict(msg)),
            other => store_failure(other),
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials, mint a new device and persist its session.
    pub async fn login(&self, phone_number: &str, password: &str) -> AppResult<TokenPair> {
        validate_phone_number(phone_number)?;

        let user = self
            .users
            .find_by_phone_number(phone_number)
            .await
            .map_err(store_failure)?
            .ok_or(AuthError::InvalidCredentials)?;

        if user.status == Status::Deleted {
            return Err(AuthError::InvalidCredentials.into());
        }

        let matches = verify_password(password, &user.password_hash).unwrap_or_else(|e| {
            tracing::warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
            false
        });
        if !matches {
            return Err(AuthError::InvalidCredentials.into());
        }

        let user_id = user.id.to_string();
        let device_id = new_device_id();
        let pair = self.issue_pair(&user, &device_id)?;

        let session = Session::new(user_id.clone(), device_id.clone(), pair.refresh_token.clone());
        self.sessions
            .save(&session, self.session_ttl)
            .await
            .map_err(store_failure)?;

        tracing::info!(user_id = %user_id, device_id = %device_id, "User logged in");
        Ok(pair)
    }

    /// Exchange a current refresh token for a new pair, rotating the session.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self
            .codec
            .decode_refresh(refresh_token)
            .map_err(|e| rejected(None, e))?;
        let user_id = claims.user_id.as_str();
        let device_id = claims.device_id.as_str();

        let session = self
            .sessions
            .get(user_id, device_id)
            .await
            .map_err(store_failure)?
            .ok_or_else(|| rejected(Some(user_id), AuthError::SessionNotFound))?;

        if !session.is_active {
            return Err(rejected(Some(user_id), AuthError::SessionInactive));
        }
        if !same_token(&session.refresh_token, refresh_token) {
            return Err(rejected(Some(user_id), AuthError::RefreshTokenReused));
        }

        // Re-read the user so the new access token carries current claims.
        let id = Uuid::parse_str(user_id)
            .map_err(|_| rejected(Some(user_id), AuthError::MalformedToken))?;
        let user = self
            .users
            .find_by_id(id)
            .await
            .map_err(store_failure)?
            .filter(|user| user.status != Status::Deleted)
            .ok_or(AuthError::InvalidCredentials)?;

        let pair = self.issue_pair(&user, device_id)?;

        let mut rotated = session;
        rotated.rotate(pair.refresh_token.clone());
        let swapped = self
            .sessions
            .replace_if_current(&rotated, refresh_token, self.session_ttl)
            .await
            .map_err(store_failure)?;
        if !swapped {
            // Another refresh, a logout or expiry got there first.
            return Err(rejected(Some(user_id), AuthError::RefreshTokenReused));
        }

        tracing::debug!(user_id = %user_id, device_id = %device_id, "Session refreshed");
        Ok(pair)
    }

    /// Revoke the device named by `refresh_token`, which must belong to the caller.
    pub async fn logout(&self, refresh_token: &str, caller_user_id: &str) -> AppResult<()> {
        let claims = self
            .codec
            .decode_refresh(refresh_token)
            .map_err(|e| rejected(Some(caller_user_id), e))?;

        if claims.user_id != caller_user_id {
            return Err(rejected(Some(caller_user_id), AuthError::IdentityMismatch));
        }

        self.sessions
            .delete(&claims.user_id, &claims.device_id)
            .await
            .map_err(store_failure)?;

        tracing::info!(user_id = %claims.user_id, device_id = %claims.device_id, "User logged out");
        Ok(())
    }

    /// Revoke every device of a user. Returns how many sessions were removed.
    pub async fn logout_all(&self, user_id: &str) -> AppResult<u64> {
        let removed = self
            .sessions
            .delete_all(user_id)
            .await
            .map_err(store_failure)?;

        tracing::info!(user_id = %user_id, removed, "User logged out of all devices");
        Ok(removed)
    }

    /// All live sessions of a user, most recently used first.
    pub async fn sessions(&self, user_id: &str) -> AppResult<Vec<Session>> {
        self.sessions.list_all(user_id).await.map_err(store_failure)
    }

    fn issue_pair(&self, user: &User, device_id: &str) -> AppResult<TokenPair> {
        let access_token = self.codec.issue_access(user).map_err(issue_failure)?;
        let refresh_token = self
            .codec
            .issue_refresh(&user.id.to_string(), device_id)
            .map_err(issue_failure)?;
        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.codec.access_expires_in(),
        })
    }
}

/// Constant-time comparison of two token strings.
fn same_token(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Log a rejected token with its internal reason and pass it through.
fn rejected(user_id: Option<&str>, err: AuthError) -> AppError {
    tracing::warn!(user_id = user_id.unwrap_or("-"), reason = %err, "Refresh token rejected");
    AppError::Auth(err)
}

fn store_failure(err: StoreError) -> AppError {
    tracing::error!(error = %err, "Session store operation failed");
    AppError::Auth(AuthError::StoreUnavailable(err.to_string()))
}

fn issue_failure(err: AuthError) -> AppError {
    tracing::error!(error = %err, "Token issuance failed");
    AppError::Auth(err)
}
