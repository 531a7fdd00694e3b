//! Authentication and session lifecycle.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- Access and refresh token issuance and validation.
//! - [`device`] -- Per-login device identifiers.
//! - [`service`] -- Login, refresh, logout and session listing.

pub mod device;
pub mod jwt;
pub mod password;
pub mod service;
