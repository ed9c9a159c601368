//! Favorite toggle endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use super::auth::CurrentUser;
use super::dto::RecipeShort;
use super::extract::Path;
use super::recipes::find_recipe;
use crate::db::favorites;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// POST /api/recipes/:id/favorite/
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<RecipeShort>)> {
    let user = current.require()?;
    let recipe = find_recipe(&state, id).await?;

    if !favorites::add_favorite(&state.db, user.id, id).await? {
        return Err(ApiError::Conflict(format!("Recipe {} is already in favorites", id)));
    }

    info!(user_id = user.id, recipe_id = id, "Favorite added");
    Ok((StatusCode::CREATED, Json(RecipeShort::from(recipe))))
}

/// DELETE /api/recipes/:id/favorite/
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let user = current.require()?;
    find_recipe(&state, id).await?;

    if !favorites::remove_favorite(&state.db, user.id, id).await? {
        return Err(ApiError::NotFound(format!("Recipe {} is not in favorites", id)));
    }

    info!(user_id = user.id, recipe_id = id, "Favorite removed");
    Ok(StatusCode::NO_CONTENT)
}
