//! Recipe endpoints
//!
//! Reads are public; writes need an authenticated caller, and update/delete
//! are reserved to the recipe's author. A create or update writes the recipe
//! row, its ingredient rows and its tag rows in one transaction.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use foodgram_common::db::{Recipe, User};
use sqlx::SqliteConnection;
use tracing::info;

use super::auth::CurrentUser;
use super::dto::{recipe_response, recipe_responses, RecipeResponse, RecipeWrite, ValidRecipe};
use super::extract::{Path, Query};
use crate::db::recipes::{self, NewRecipe, RecipeFilter, RecipeUpdate};
use crate::db::{ingredients, tags};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{Page, PageQuery};
use crate::AppState;

/// Query parameters of the recipe list
///
/// Parsed from raw pairs because `tags` may repeat.
#[derive(Debug, Default)]
pub struct RecipeListParams {
    pub page: PageQuery,
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeListParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> ApiResult<Self> {
        let mut params = Self::default();

        for (key, value) in pairs {
            match key.as_str() {
                "page" => params.page.page = Some(parse_int(&key, &value)?),
                "limit" => params.page.limit = Some(parse_int(&key, &value)?),
                "author" => params.author = Some(parse_int(&key, &value)?),
                "tags" if !value.is_empty() => params.tags.push(value),
                "is_favorited" => params.is_favorited = parse_flag(&key, &value)?,
                "is_in_shopping_cart" => params.is_in_shopping_cart = parse_flag(&key, &value)?,
                _ => {}
            }
        }

        Ok(params)
    }

    /// Storage filter for this request; the flag filters need a caller
    pub fn filter(&self, viewer: Option<i64>) -> RecipeFilter {
        RecipeFilter {
            author: self.author,
            tags: self.tags.clone(),
            favorited_by: viewer.filter(|_| self.is_favorited),
            in_cart_of: viewer.filter(|_| self.is_in_shopping_cart),
        }
    }
}

fn parse_int(key: &str, value: &str) -> ApiResult<i64> {
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("'{}' must be an integer, got '{}'", key, value)))
}

fn parse_flag(key: &str, value: &str) -> ApiResult<bool> {
    match value {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        _ => Err(ApiError::BadRequest(format!(
            "'{}' must be 0 or 1, got '{}'",
            key, value
        ))),
    }
}

/// Load a recipe or fail with 404
pub(crate) async fn find_recipe(state: &AppState, id: i64) -> ApiResult<Recipe> {
    recipes::get_recipe(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Recipe {}", id)))
}

fn ensure_author(recipe: &Recipe, user: &User) -> ApiResult<()> {
    if recipe.author_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the author can change this recipe".to_string(),
        ));
    }
    Ok(())
}

/// Every referenced ingredient and tag must exist
async fn check_references(conn: &mut SqliteConnection, recipe: &ValidRecipe) -> ApiResult<()> {
    let ingredient_ids: Vec<i64> = recipe.ingredients.iter().map(|(id, _)| *id).collect();
    let missing = ingredients::missing_ingredient_ids(conn, &ingredient_ids).await?;
    if !missing.is_empty() {
        return Err(ApiError::NotFound(format!("Ingredients {}", join_ids(&missing))));
    }

    let missing = tags::missing_tag_ids(conn, &recipe.tag_ids).await?;
    if !missing.is_empty() {
        return Err(ApiError::NotFound(format!("Tags {}", join_ids(&missing))));
    }

    Ok(())
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

/// GET /api/recipes/?page&limit&author&tags&is_favorited&is_in_shopping_cart
pub async fn list_recipes(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Page<RecipeResponse>>> {
    let params = RecipeListParams::from_pairs(pairs)?;
    let viewer = current.id();
    let filter = params.filter(viewer);

    let total = recipes::count_recipes(&state.db, &filter).await?;
    let pagination = params.page.paginate(total);
    let rows = recipes::list_recipes(&state.db, &filter, pagination.page_size, pagination.offset)
        .await?;

    let results = recipe_responses(&state.db, rows, viewer).await?;

    Ok(Json(Page::new(total, pagination, results)))
}

/// GET /api/recipes/:id/
pub async fn get_recipe(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<RecipeResponse>> {
    let recipe = find_recipe(&state, id).await?;
    Ok(Json(recipe_response(&state.db, recipe, current.id()).await?))
}

/// POST /api/recipes/
pub async fn create_recipe(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    payload: Result<Json<RecipeWrite>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RecipeResponse>)> {
    let user = current.require()?;
    let Json(payload) = payload?;
    let valid = payload.validate(true)?;

    let mut tx = state.db.begin().await?;
    check_references(&mut tx, &valid).await?;

    let id = recipes::insert_recipe(
        &mut tx,
        &NewRecipe {
            author_id: user.id,
            name: valid.name.clone(),
            image: valid.image.clone().unwrap_or_default(),
            text: valid.text.clone(),
            cooking_time: valid.cooking_time,
        },
    )
    .await?;
    recipes::replace_ingredients(&mut tx, id, &valid.ingredients).await?;
    recipes::replace_tags(&mut tx, id, &valid.tag_ids).await?;
    tx.commit().await?;

    info!(recipe_id = id, author_id = user.id, "Recipe created");

    let recipe = find_recipe(&state, id).await?;
    let body = recipe_response(&state.db, recipe, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// PATCH /api/recipes/:id/
///
/// Replaces the scalar fields, the ingredient set and the tag set.
/// Omitting `image` keeps the stored one.
pub async fn update_recipe(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
    payload: Result<Json<RecipeWrite>, JsonRejection>,
) -> ApiResult<Json<RecipeResponse>> {
    let user = current.require()?;
    let recipe = find_recipe(&state, id).await?;
    ensure_author(&recipe, user)?;

    let Json(payload) = payload?;
    let valid = payload.validate(false)?;

    let mut tx = state.db.begin().await?;
    check_references(&mut tx, &valid).await?;

    recipes::update_recipe(
        &mut tx,
        id,
        &RecipeUpdate {
            name: valid.name.clone(),
            image: valid.image.clone(),
            text: valid.text.clone(),
            cooking_time: valid.cooking_time,
        },
    )
    .await?;
    recipes::replace_ingredients(&mut tx, id, &valid.ingredients).await?;
    recipes::replace_tags(&mut tx, id, &valid.tag_ids).await?;
    tx.commit().await?;

    info!(recipe_id = id, "Recipe updated");

    let recipe = find_recipe(&state, id).await?;
    Ok(Json(recipe_response(&state.db, recipe, Some(user.id)).await?))
}

/// DELETE /api/recipes/:id/
pub async fn delete_recipe(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let user = current.require()?;
    let recipe = find_recipe(&state, id).await?;
    ensure_author(&recipe, user)?;

    if !recipes::delete_recipe(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("Recipe {}", id)));
    }

    info!(recipe_id = id, "Recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}
