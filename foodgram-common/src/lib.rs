//! # Foodgram Common Library
//!
//! Shared code for the Foodgram service and its tooling:
//! - Database initialization, schema and migrations
//! - Entity models
//! - API token hashing
//! - Configuration loading
//! - Shopping-list aggregation

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod shopping_list;

pub use error::{Error, Result};
pub use shopping_list::{ShoppingItem, ShoppingLine};
