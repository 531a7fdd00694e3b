//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Decodes the Bearer access token.
//! - [`rbac::RequireActive`] -- Requires an `Active` account.
//! - [`rbac::RequireAdmin`] -- Requires `Admin` or `SuperAdmin`.

pub mod auth;
pub mod rbac;
