//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Database operations (via sqlx)
//!
//! The service wraps these with axum middleware.

pub mod auth;

pub use auth::{
    generate_token, hash_token, issue_token, parse_authorization, resolve_token, ApiAuthError,
};
