//! Credential lookup for the `users` table.

use async_trait::async_trait;
use autoban_core::roles::{Role, Status};
use autoban_core::types::{Timestamp, UserId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::user::{CreateUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, phone_number, password_hash, role, status, created_at";

/// PostgreSQL error code for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// User lookups consumed by the authentication flow.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Insert a new user. A duplicate phone number yields [`StoreError::Conflict`].
    async fn create(&self, input: &CreateUser) -> Result<User, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Raw row; role and status are stored as `SMALLINT` codes.
#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    phone_number: String,
    password_hash: String,
    role: i16,
    status: i16,
    created_at: Timestamp,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::Corrupt {
            key: format!("users/{}", row.id),
            reason,
        };
        let role = Role::from_code(i64::from(row.role)).map_err(|e| corrupt(e.to_string()))?;
        let status = Status::from_code(i64::from(row.status)).map_err(|e| corrupt(e.to_string()))?;
        Ok(User {
            id: row.id,
            phone_number: row.phone_number,
            password_hash: row.password_hash,
            role,
            status,
            created_at: row.created_at,
        })
    }
}

/// [`UserRepo`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE phone_number = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn create(&self, input: &CreateUser) -> Result<User, StoreError> {
        let query = format!(
            "INSERT INTO users (id, phone_number, password_hash, role, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.phone_number)
            .bind(&input.password_hash)
            .bind(input.role.code() as i16)
            .bind(input.status.code() as i16)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let duplicate = matches!(
                    &e,
                    sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
                );
                if duplicate {
                    StoreError::Conflict("Phone number is already registered".into())
                } else {
                    StoreError::Database(e)
                }
            })?;
        User::try_from(row)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
