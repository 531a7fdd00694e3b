//! Shared domain types for the AutoBan backend.
//!
//! - [`types`] -- primitive aliases used across crates.
//! - [`roles`] -- user roles and account statuses with their wire codec.
//! - [`validation`] -- input format checks shared by handlers.
//! - [`error`] -- domain and authentication error taxonomies.

pub mod error;
pub mod roles;
pub mod types;
pub mod validation;
