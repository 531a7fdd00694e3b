//! Redis-backed [`SessionRepo`].
//!
//! Each session is a JSON string under [`session_key`] written with `SET … EX`,
//! so Redis expires stale sessions on its own. Per-user enumeration uses
//! cursor-based `SCAN MATCH` rather than `KEYS`. Conditional rotation runs as a
//! Lua script so the compare and the write happen atomically on the server.
//!
//! Every command is bounded by the configured operation timeout; a timeout is
//! reported as [`StoreError::Timeout`] and never retried here.
//!
//! A timed-out rotation may still have been applied by the server, which
//! would leave the client with a 500 and the session holding a token nobody
//! received. After an `EVALSHA` timeout the record is read back on the same
//! connection (commands are answered in order) and the rotation counts as
//! done when the stored token is the new one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult, Script};

use super::session_repo::{
    decode_session, encode_session, session_key, sort_by_recent_use, user_key_pattern,
    SessionRepo,
};
use crate::error::StoreError;
use crate::models::session::Session;

/// Keys requested per `SCAN` step.
const SCAN_BATCH: usize = 100;

/// KEYS[1] = session key, ARGV[1] = expected refresh token,
/// ARGV[2] = new payload, ARGV[3] = TTL in seconds.
const REPLACE_IF_CURRENT_LUA: &str = r"
local current = redis.call('GET', KEYS[1])
if not current then
  return 0
end
local ok, decoded = pcall(cjson.decode, current)
if not ok or decoded['refresh_token'] ~= ARGV[1] then
  return 0
end
redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
return 1
";

/// Session repository on top of a multiplexed, auto-reconnecting Redis
/// connection. Cheap to clone.
#[derive(Clone)]
pub struct RedisSessionRepo {
    conn: ConnectionManager,
    op_timeout: Duration,
    replace_script: Arc<Script>,
}

impl RedisSessionRepo {
    pub fn new(conn: ConnectionManager, op_timeout: Duration) -> Self {
        Self {
            conn,
            op_timeout,
            replace_script: Arc::new(Script::new(REPLACE_IF_CURRENT_LUA)),
        }
    }

    /// Await one Redis command under the operation deadline.
    async fn run<T, F>(&self, command: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!(error = %e, command, "Redis command failed");
                Err(StoreError::from(e))
            }
            Err(_) => {
                tracing::error!(
                    command,
                    timeout_ms = self.op_timeout.as_millis() as u64,
                    "Redis command timed out"
                );
                Err(StoreError::Timeout(self.op_timeout))
            }
        }
    }

    /// Collect every key matching `pattern` with a full `SCAN` cycle.
    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let mut conn = self.conn.clone();
            let pattern = pattern.to_string();
            let (next, batch): (u64, Vec<String>) = self
                .run("SCAN", async move {
                    redis::cmd("SCAN")
                        .arg(cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(SCAN_BATCH)
                        .query_async(&mut conn)
                        .await
                })
                .await?;
            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }
        // SCAN may yield a key more than once across a rehash.
        keys.sort_unstable();
        keys.dedup();
        Ok(keys)
    }

    async fn get_payload(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let key = key.to_string();
        self.run("GET", async move { conn.get::<_, Option<String>>(&key).await })
            .await
    }
}

#[async_trait]
impl SessionRepo for RedisSessionRepo {
    async fn save(&self, session: &Session, ttl: Duration) -> Result<(), StoreError> {
        let key = session_key(&session.user_id, &session.device_id);
        let payload = encode_session(session)?;
        let secs = ttl_secs(ttl);
        let mut conn = self.conn.clone();
        self.run("SET", async move { conn.set_ex::<_, _, ()>(&key, payload, secs).await })
            .await
    }

    async fn get(&self, user_id: &str, device_id: &str) -> Result<Option<Session>, StoreError> {
        let key = session_key(user_id, device_id);
        match self.get_payload(&key).await? {
            Some(payload) => decode_session(&key, &payload).map(Some),
            None => Ok(None),
        }
    }

    async fn replace_if_current(
        &self,
        session: &Session,
        expected_refresh_token: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let key = session_key(&session.user_id, &session.device_id);
        let payload = encode_session(session)?;
        let expected = expected_refresh_token.to_string();
        let secs = ttl_secs(ttl);
        let script = Arc::clone(&self.replace_script);
        let mut conn = self.conn.clone();
        let script_key = key.clone();

        let outcome = self
            .run("EVALSHA", async move {
                let mut invocation = script.key(&script_key);
                invocation.arg(&expected).arg(&payload).arg(secs);
                let swapped: i64 = invocation.invoke_async(&mut conn).await?;
                Ok::<_, redis::RedisError>(swapped)
            })
            .await;

        match outcome {
            Ok(swapped) => Ok(swapped == 1),
            Err(StoreError::Timeout(elapsed)) => {
                let stored = self.get_payload(&key).await?;
                if holds_token(&key, stored.as_deref(), &session.refresh_token) {
                    tracing::warn!(key = %key, "Rotation applied although its reply timed out");
                    Ok(true)
                } else {
                    Err(StoreError::Timeout(elapsed))
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn delete(&self, user_id: &str, device_id: &str) -> Result<(), StoreError> {
        let key = session_key(user_id, device_id);
        let mut conn = self.conn.clone();
        let _: i64 = self
            .run("DEL", async move { conn.del(&key).await })
            .await?;
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64, StoreError> {
        let keys = self.scan_keys(&user_key_pattern(user_id)).await?;
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let removed: i64 = self
            .run("DEL", async move { conn.del(&keys).await })
            .await?;
        Ok(removed.max(0) as u64)
    }

    async fn list_all(&self, user_id: &str) -> Result<Vec<Session>, StoreError> {
        let keys = self.scan_keys(&user_key_pattern(user_id)).await?;
        let mut sessions = Vec::with_capacity(keys.len());
        for key in keys {
            // Expired or deleted between SCAN and GET.
            let Some(payload) = self.get_payload(&key).await? else {
                continue;
            };
            sessions.push(decode_session(&key, &payload)?);
        }
        sort_by_recent_use(&mut sessions);
        Ok(sessions)
    }

    async fn ttl(&self, user_id: &str, device_id: &str) -> Result<Option<Duration>, StoreError> {
        let key = session_key(user_id, device_id);
        let mut conn = self.conn.clone();
        let remaining: i64 = self
            .run("TTL", async move { conn.ttl(&key).await })
            .await?;
        // -2: no such key, -1: key without expiry (never written by this repo).
        Ok((remaining >= 0).then(|| Duration::from_secs(remaining as u64)))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = self
            .run("PING", async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?;
        Ok(())
    }
}

/// Whether a stored payload carries `refresh_token`.
fn holds_token(key: &str, payload: Option<&str>, refresh_token: &str) -> bool {
    payload
        .and_then(|p| decode_session(key, p).ok())
        .is_some_and(|stored| stored.refresh_token == refresh_token)
}

/// Redis rejects `EX 0`; sub-second TTLs round up to one second.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
