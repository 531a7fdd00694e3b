/// Request-level domain errors: bad input, duplicates, missing permissions.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

/// Failures of the login / refresh / logout protocol.
///
/// Variants are fine-grained for logging and tests. The HTTP
/// layer collapses every [`AuthError::is_token_failure`] variant into one
/// response so callers cannot tell which check rejected them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid phone number or password")]
    InvalidCredentials,

    #[error("No authentication token presented")]
    TokenMissing,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token signature verification failed")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Session is inactive")]
    SessionInactive,

    /// The refresh token was valid once but has since been rotated away, or
    /// a concurrent refresh rotated it first.
    #[error("Refresh token is no longer current for its session")]
    RefreshTokenReused,

    #[error("Token does not belong to the caller")]
    IdentityMismatch,

    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Token issuance failed: {0}")]
    TokenIssue(String),
}

impl AuthError {
    /// `true` when the presented token (or the session behind it) was rejected.
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            AuthError::TokenMissing
                | AuthError::MalformedToken
                | AuthError::InvalidSignature
                | AuthError::Expired
                | AuthError::SessionNotFound
                | AuthError::SessionInactive
                | AuthError::RefreshTokenReused
                | AuthError::IdentityMismatch
        )
    }
}
