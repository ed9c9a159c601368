//! HTTP API handlers
//!
//! Everything except `/health` lives under `/api` and passes through
//! [`auth_middleware`].

pub mod auth;
pub mod dto;
pub mod extract;
pub mod favorites;
pub mod health;
pub mod ingredients;
pub mod recipes;
pub mod shopping_cart;
pub mod tags;
pub mod users;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub use auth::{auth_middleware, CurrentUser};
pub use health::health_routes;

/// Routes nested under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/tags/", get(tags::list_tags))
        .route("/tags/:id/", get(tags::get_tag))
        .route("/ingredients/", get(ingredients::list_ingredients))
        .route("/ingredients/:id/", get(ingredients::get_ingredient))
        .route(
            "/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipes/download_shopping_cart/",
            get(shopping_cart::download_shopping_cart),
        )
        .route(
            "/recipes/:id/",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipes/:id/favorite/",
            post(favorites::add_favorite).delete(favorites::remove_favorite),
        )
        .route(
            "/recipes/:id/shopping_cart/",
            post(shopping_cart::add_to_cart).delete(shopping_cart::remove_from_cart),
        )
        .route("/users/", get(users::list_users))
        .route("/users/me/", get(users::me))
        .route("/users/subscriptions/", get(users::list_subscriptions))
        .route("/users/:id/", get(users::get_user))
        .route(
            "/users/:id/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
}
