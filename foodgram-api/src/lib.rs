//! Foodgram service library
//!
//! Recipe publishing backend: tags, ingredients, recipes, favorites,
//! shopping carts with a downloadable shopping list, and author
//! subscriptions, served as a JSON API over SQLite.

use axum::{extract::DefaultBodyLimit, middleware, Router};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod admin;
pub mod api;
pub mod db;
pub mod error;
pub mod pagination;

pub use error::{ApiError, ApiResult};

/// Largest accepted request body; recipe images travel inline
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
}

impl AppState {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

/// Build application router
///
/// `/api/*` routes resolve the caller through the auth middleware;
/// `/health` is public.
pub fn build_router(state: AppState) -> Router {
    let api_router = api::api_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::auth_middleware,
    ));

    Router::new()
        .nest("/api", api_router)
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
