//! User roles and account statuses.
//!
//! Both enums travel inside access-token claims and the `users` table as plain
//! integers. [`Role::code`] / [`Role::from_code`] (and the [`Status`]
//! counterparts) are the only conversion points: serde routes through them via
//! `into = "i64"` / `try_from = "i64"`, so a claim is either decoded into a
//! known variant or rejected. Fractional, negative, or out-of-range numbers never
//! get truncated into a valid code.

use serde::{Deserialize, Serialize};

/// An integer that does not map to any known role or status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: i64,
}

/// Authorization role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Role {
    User,
    SuperAdmin,
    Admin,
}

impl Role {
    /// Wire/storage code for this role.
    pub const fn code(self) -> i64 {
        match self {
            Role::User => 0,
            Role::SuperAdmin => 1,
            Role::Admin => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, UnknownCode> {
        match code {
            0 => Ok(Role::User),
            1 => Ok(Role::SuperAdmin),
            2 => Ok(Role::Admin),
            _ => Err(UnknownCode { kind: "role", code }),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
        }
    }

    /// `true` for `Admin` and `SuperAdmin`.
    pub const fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role.code()
    }
}

impl TryFrom<i64> for Role {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Role::from_code(code)
    }
}

/// Lifecycle status of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i64", try_from = "i64")]
pub enum Status {
    Active,
    Deactivated,
    Deleted,
}

impl Status {
    pub const fn code(self) -> i64 {
        match self {
            Status::Active => 0,
            Status::Deactivated => 1,
            Status::Deleted => 2,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, UnknownCode> {
        match code {
            0 => Ok(Status::Active),
            1 => Ok(Status::Deactivated),
            2 => Ok(Status::Deleted),
            _ => Err(UnknownCode {
                kind: "status",
                code,
            }),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Deactivated => "deactivated",
            Status::Deleted => "deleted",
        }
    }

    pub const fn is_active(self) -> bool {
        matches!(self, Status::Active)
    }
}

impl From<Status> for i64 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<i64> for Status {
    type Error = UnknownCode;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Status::from_code(code)
    }
}
