//! Shopping cart endpoints and the shopping-list download

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use foodgram_common::shopping_list::{self, SHOPPING_LIST_FILE_NAME};
use tracing::{debug, info};

use super::auth::CurrentUser;
use super::dto::RecipeShort;
use super::extract::Path;
use super::recipes::find_recipe;
use crate::db::shopping_cart;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/recipes/:id/shopping_cart/
pub async fn add_to_cart(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RecipeShort>)> {
    let user = current.require()?;
    let recipe = find_recipe(&state, id).await?;

    if !shopping_cart::add_to_cart(&state.db, user.id, id).await? {
        return Err(ApiError::Conflict(format!(
            "Recipe {} is already in the shopping cart",
            id
        )));
    }

    info!(user_id = user.id, recipe_id = id, "Added to shopping cart");
    Ok((StatusCode::CREATED, Json(RecipeShort::from(recipe))))
}

/// DELETE /api/recipes/:id/shopping_cart/
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let user = current.require()?;
    find_recipe(&state, id).await?;

    if !shopping_cart::remove_from_cart(&state.db, user.id, id).await? {
        return Err(ApiError::NotFound(format!(
            "Recipe {} is not in the shopping cart",
            id
        )));
    }

    info!(user_id = user.id, recipe_id = id, "Removed from shopping cart");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/recipes/download_shopping_cart/
///
/// Plain-text attachment, one aggregated ingredient per line. An empty cart
/// yields an empty file.
pub async fn download_shopping_cart(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    let user = current.require()?;

    let lines = shopping_cart::shopping_lines(&state.db, user.id).await?;
    let items = shopping_list::aggregate(lines)?;
    debug!(user_id = user.id, items = items.len(), "Shopping list built");

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", SHOPPING_LIST_FILE_NAME),
        ),
    ];

    Ok((headers, shopping_list::render(&items)))
}
