//! In-process repository implementations.
//!
//! [`MemorySessionRepo`] honours the same contract as the Redis repository,
//! including TTL expiry (driven by `tokio::time`, so tests can pause and
//! advance the clock) and the atomic compare-and-replace. [`MemoryUserRepo`]
//! enforces the unique phone number constraint of the `users` table.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use autoban_core::types::UserId;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

use super::session_repo::{
    decode_session, encode_session, session_key, sort_by_recent_use, user_key_prefix,
    SessionRepo,
};
use super::user_repo::UserRepo;
use crate::error::StoreError;
use crate::models::session::Session;
use crate::models::user::{CreateUser, User};

struct Entry {
    payload: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// Session store held in a process-local map.
#[derive(Default)]
pub struct MemorySessionRepo {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemorySessionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) records across all users.
    pub async fn live_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| entry.is_live(now))
            .count()
    }
}

#[async_trait]
impl SessionRepo for MemorySessionRepo {
    async fn save(&self, session: &Session, ttl: Duration) -> Result<(), StoreError> {
        let key = session_key(&session.user_id, &session.device_id);
        let payload = encode_session(session)?;
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key,
            Entry {
                payload,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, user_id: &str, device_id: &str) -> Result<Option<Session>, StoreError> {
        let key = session_key(user_id, device_id);
        let entries = self.entries.read().await;
        match entries.get(&key) {
            Some(entry) if entry.is_live(Instant::now()) => {
                decode_session(&key, &entry.payload).map(Some)
            }
            _ => Ok(None),
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
        let now = Instant::now();

        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(&key).filter(|entry| entry.is_live(now)) else {
            return Ok(false);
        };
        let current = decode_session(&key, &entry.payload)?;
        if current.refresh_token != expected_refresh_token {
            return Ok(false);
        }
        *entry = Entry {
            payload,
            expires_at: now + ttl,
        };
        Ok(true)
    }

    async fn delete(&self, user_id: &str, device_id: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .remove(&session_key(user_id, device_id));
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> Result<u64, StoreError> {
        let prefix = user_key_prefix(user_id);
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let mut removed = 0;
        entries.retain(|key, entry| {
            if key.starts_with(&prefix) {
                if entry.is_live(now) {
                    removed += 1;
                }
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    async fn list_all(&self, user_id: &str) -> Result<Vec<Session>, StoreError> {
        let prefix = user_key_prefix(user_id);
        let now = Instant::now();
        let entries = self.entries.read().await;
        let mut sessions = entries
            .iter()
            .filter(|(key, entry)| key.starts_with(&prefix) && entry.is_live(now))
            .map(|(key, entry)| decode_session(key, &entry.payload))
            .collect::<Result<Vec<_>, _>>()?;
        sort_by_recent_use(&mut sessions);
        Ok(sessions)
    }

    async fn ttl(&self, user_id: &str, device_id: &str) -> Result<Option<Duration>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        Ok(entries
            .get(&session_key(user_id, device_id))
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at - now))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// User table held in a process-local map.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<HashMap<UserId, User>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.phone_number == phone_number)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|user| user.phone_number == input.phone_number)
        {
            return Err(StoreError::Conflict(
                "Phone number is already registered".into(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            phone_number: input.phone_number.clone(),
            password_hash: input.password_hash.clone(),
            role: input.role,
            status: input.status,
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use autoban_core::roles::{Role, Status};

    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 3600);

    fn session(user: &str, device: &str, token: &str) -> Session {
        Session::new(user.into(), device.into(), token.into())
    }

    #[tokio::test]
    async fn save_then_get_returns_record() {
        let repo = MemorySessionRepo::new();
        repo.save(&session("u", "d", "t1"), WEEK).await.unwrap();

        let stored = repo.get("u", "d").await.unwrap().expect("session present");
        assert_eq!(stored.refresh_token, "t1");
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn save_overwrites_same_device() {
        let repo = MemorySessionRepo::new();
        repo.save(&session("u", "d", "t1"), WEEK).await.unwrap();
        repo.save(&session("u", "d", "t2"), WEEK).await.unwrap();

        assert_eq!(repo.live_count().await, 1);
        assert_eq!(repo.get("u", "d").await.unwrap().unwrap().refresh_token, "t2");
    }

    #[tokio::test(start_paused = true)]
    async fn records_expire_after_ttl() {
        let repo = MemorySessionRepo::new();
        repo.save(&session("u", "d", "t"), WEEK).await.unwrap();

        tokio::time::advance(WEEK - Duration::from_secs(1)).await;
        assert!(repo.get("u", "d").await.unwrap().is_some());
        assert_eq!(
            repo.ttl("u", "d").await.unwrap(),
            Some(Duration::from_secs(1))
        );

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(repo.get("u", "d").await.unwrap().is_none());
        assert!(repo.ttl("u", "d").await.unwrap().is_none());
        assert!(repo.list_all("u").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_if_current_requires_matching_token() {
        let repo = MemorySessionRepo::new();
        repo.save(&session("u", "d", "t1"), WEEK).await.unwrap();

        let stale = repo
            .replace_if_current(&session("u", "d", "t3"), "t0", WEEK)
            .await
            .unwrap();
        assert!(!stale);
        assert_eq!(repo.get("u", "d").await.unwrap().unwrap().refresh_token, "t1");

        let current = repo
            .replace_if_current(&session("u", "d", "t2"), "t1", WEEK)
            .await
            .unwrap();
        assert!(current);
        assert_eq!(repo.get("u", "d").await.unwrap().unwrap().refresh_token, "t2");
    }

    #[tokio::test]
    async fn replace_if_current_does_not_resurrect_deleted_session() {
        let repo = MemorySessionRepo::new();
        let swapped = repo
            .replace_if_current(&session("u", "d", "t2"), "t1", WEEK)
            .await
            .unwrap();
        assert!(!swapped);
        assert!(repo.get("u", "d").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_scoped() {
        let repo = MemorySessionRepo::new();
        repo.save(&session("u", "d1", "a"), WEEK).await.unwrap();
        repo.save(&session("u", "d2", "b"), WEEK).await.unwrap();

        repo.delete("u", "d1").await.unwrap();
        repo.delete("u", "d1").await.unwrap();

        assert!(repo.get("u", "d1").await.unwrap().is_none());
        assert!(repo.get("u", "d2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_all_only_touches_one_user() {
        let repo = MemorySessionRepo::new();
        repo.save(&session("u1", "d1", "a"), WEEK).await.unwrap();
        repo.save(&session("u1", "d2", "b"), WEEK).await.unwrap();
        // Shares a textual prefix with "u1" but is a different user.
        repo.save(&session("u10", "d1", "c"), WEEK).await.unwrap();

        assert_eq!(repo.delete_all("u1").await.unwrap(), 2);
        assert!(repo.list_all("u1").await.unwrap().is_empty());
        assert_eq!(repo.list_all("u10").await.unwrap().len(), 1);
        assert_eq!(repo.delete_all("nobody").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn user_phone_numbers_are_unique() {
        let repo = MemoryUserRepo::new();
        let input = CreateUser {
            phone_number: "09123456789".into(),
            password_hash: "hash".into(),
            role: Role::User,
            status: Status::Active,
        };
        let user = repo.create(&input).await.unwrap();

        assert_matches!(repo.create(&input).await, Err(StoreError::Conflict(_)));
        let found = repo
            .find_by_phone_number("09123456789")
            .await
            .unwrap()
            .expect("user present");
        assert_eq!(found.id, user.id);
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }
}
