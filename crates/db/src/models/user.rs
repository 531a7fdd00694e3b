//! User record as seen by the authentication flow.

use autoban_core::roles::{Role, Status};
use autoban_core::types::{Timestamp, UserId};

/// A row from the `users` table.
///
/// Not `Serialize`: the password hash must never reach a response body.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub phone_number: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: Role,
    pub status: Status,
    pub created_at: Timestamp,
}

/// DTO for inserting a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub phone_number: String,
    pub password_hash: String,
    pub role: Role,
    pub status: Status,
}
