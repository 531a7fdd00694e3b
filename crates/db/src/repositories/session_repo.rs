//! Session store contract and key layout.
//!
//! Sessions live in a TTL-capable key-value store, one record per
//! (user, device) under [`session_key`]. Implementations:
//!
//! - [`RedisSessionRepo`](super::RedisSessionRepo) for production.
//! - [`MemorySessionRepo`](super::MemorySessionRepo) for tests and local runs.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::session::Session;

/// Namespace shared by every session key.
pub const SESSION_KEY_PREFIX: &str = "session";

/// Storage key for one device session: `session:{user_id}:{device_id}`.
pub fn session_key(user_id: &str, device_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}:{user_id}:{device_id}")
}

/// Literal prefix shared by all of a user's session keys.
pub fn user_key_prefix(user_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}:{user_id}:")
}

/// Glob pattern matching all of a user's session keys (for `SCAN MATCH`).
///
/// Glob metacharacters in `user_id` are escaped so one user's pattern can
/// never match another user's keys.
pub fn user_key_pattern(user_id: &str) -> String {
    let mut pattern = String::with_capacity(user_id.len() + 16);
    pattern.push_str(SESSION_KEY_PREFIX);
    pattern.push(':');
    for ch in user_id.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push_str(":*");
    pattern
}

/// Persistence of per-device sessions with store-enforced expiry.
///
/// Every method is a single logical round-trip; none retries internally.
#[async_trait]
pub trait SessionRepo: Send + Sync {
    /// Upsert a session and (re)set its TTL.
    async fn save(&self, session: &Session, ttl: Duration) -> Result<(), StoreError>;

    /// Fetch a live session. `None` when absent or expired.
    async fn get(&self, user_id: &str, device_id: &str) -> Result<Option<Session>, StoreError>;

    /// Overwrite a session only if its stored refresh token still equals
    /// `expected_refresh_token`, resetting the TTL. The check and the write are
    /// atomic.
    ///
    /// Returns `false` (and writes nothing) when the record is gone or holds a
    /// different token.
    async fn replace_if_current(
        &self,
        session: &Session,
        expected_refresh_token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Remove one session. Succeeds when it is already absent.
    async fn delete(&self, user_id: &str, device_id: &str) -> Result<(), StoreError>;

    /// Remove every session of a user. Returns how many were removed.
    async fn delete_all(&self, user_id: &str) -> Result<u64, StoreError>;

    /// All live sessions of a user, most recently used first.
    async fn list_all(&self, user_id: &str) -> Result<Vec<Session>, StoreError>;

    /// Remaining lifetime of a session, `None` when absent.
    async fn ttl(&self, user_id: &str, device_id: &str) -> Result<Option<Duration>, StoreError>;

    /// Round-trip to the backing store.
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Decode a stored payload, tagging failures with the key they came from.
pub(crate) fn decode_session(key: &str, payload: &str) -> Result<Session, StoreError> {
    serde_json::from_str(payload).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

pub(crate) fn encode_session(session: &Session) -> Result<String, StoreError> {
    serde_json::to_string(session).map_err(|e| StoreError::Corrupt {
        key: session_key(&session.user_id, &session.device_id),
        reason: e.to_string(),
    })
}

/// Most recently used first.
pub(crate) fn sort_by_recent_use(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.last_used.cmp(&a.last_used));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        assert_eq!(session_key("u1", "d1"), "session:u1:d1");
        assert_eq!(user_key_prefix("u1"), "session:u1:");
        assert_eq!(user_key_pattern("u1"), "session:u1:*");
    }

    #[test]
    fn pattern_escapes_glob_metacharacters() {
        assert_eq!(user_key_pattern("a*b?[c]"), r"session:a\*b\?\[c\]:*");
    }

    #[test]
    fn corrupt_payload_reports_key() {
        let err = decode_session("session:u:d", "{not json").unwrap_err();
        match err {
            StoreError::Corrupt { key, .. } => assert_eq!(key, "session:u:d"),
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }
}
