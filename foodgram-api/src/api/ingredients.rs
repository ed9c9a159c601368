//! Ingredient endpoints (read-only)

use axum::{
    extract::State,
    Json,
};
use foodgram_common::db::Ingredient;
use serde::Deserialize;

use super::extract::{Path, Query};
use crate::db::ingredients;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct IngredientQuery {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

/// GET /api/ingredients/?name=
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<IngredientQuery>,
) -> ApiResult<Json<Vec<Ingredient>>> {
    Ok(Json(
        ingredients::list_ingredients(&state.db, query.name.as_deref()).await?,
    ))
}

/// GET /api/ingredients/:id/
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Ingredient>> {
    ingredients::get_ingredient(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Ingredient {}", id)))
}
