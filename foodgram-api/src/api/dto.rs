//! Request and response bodies
//!
//! Responses are assembled from row structs plus per-caller flags
//! (`is_subscribed`, `is_favorited`, `is_in_shopping_cart`), which are always
//! false for anonymous callers. The builders take a whole page of rows and
//! look up flags and junction rows once per page.

use foodgram_common::db::{
    Recipe, RecipeIngredient, Tag, User, MAX_QUANTITY, MAX_RECIPE_NAME_LEN,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

use crate::db::{favorites, recipes, shopping_cart, subscriptions, tags, users};
use crate::error::{ApiError, ApiResult, FieldErrors};

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// Compact recipe used by favorite/cart toggles and subscription previews
#[derive(Debug, Clone, Serialize)]
pub struct RecipeShort {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl From<Recipe> for RecipeShort {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeResponse {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

/// A followed author with a preview of their recipes
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub author: UserResponse,
    pub recipes: Vec<RecipeShort>,
    pub recipes_count: i64,
}

fn to_user_response(user: User, is_subscribed: bool) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed,
    }
}

/// Distinct values in first-seen order
fn distinct(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn single<T>(mut items: Vec<T>) -> ApiResult<T> {
    items
        .pop()
        .ok_or_else(|| ApiError::Internal("Response builder returned nothing".to_string()))
}

pub async fn user_responses(
    db: &SqlitePool,
    users: Vec<User>,
    viewer: Option<i64>,
) -> ApiResult<Vec<UserResponse>> {
    let subscribed = match viewer {
        Some(viewer) => {
            let ids = distinct(users.iter().map(|user| user.id));
            subscriptions::subscribed_among(db, viewer, &ids).await?
        }
        None => HashSet::new(),
    };

    Ok(users
        .into_iter()
        .map(|user| {
            let is_subscribed = subscribed.contains(&user.id);
            to_user_response(user, is_subscribed)
        })
        .collect())
}

pub async fn user_response(
    db: &SqlitePool,
    user: User,
    viewer: Option<i64>,
) -> ApiResult<UserResponse> {
    single(user_responses(db, vec![user], viewer).await?)
}

/// Full representations of a page of recipes, in input order
pub async fn recipe_responses(
    db: &SqlitePool,
    page: Vec<Recipe>,
    viewer: Option<i64>,
) -> ApiResult<Vec<RecipeResponse>> {
    let recipe_ids: Vec<i64> = page.iter().map(|recipe| recipe.id).collect();
    let author_ids = distinct(page.iter().map(|recipe| recipe.author_id));

    let authors = users::users_by_ids(db, &author_ids).await?;
    let authors: HashMap<i64, UserResponse> = user_responses(db, authors, viewer)
        .await?
        .into_iter()
        .map(|author| (author.id, author))
        .collect();

    let (favorited, in_cart) = match viewer {
        Some(viewer) => (
            favorites::favorited_among(db, viewer, &recipe_ids).await?,
            shopping_cart::in_cart_among(db, viewer, &recipe_ids).await?,
        ),
        None => (HashSet::new(), HashSet::new()),
    };
    let mut tags = tags::tags_for_recipes(db, &recipe_ids).await?;
    let mut ingredients = recipes::ingredients_for_recipes(db, &recipe_ids).await?;

    page.into_iter()
        .map(|recipe| -> ApiResult<RecipeResponse> {
            let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                ApiError::Internal(format!("Recipe {} has no author", recipe.id))
            })?;
            Ok(RecipeResponse {
                id: recipe.id,
                tags: tags.remove(&recipe.id).unwrap_or_default(),
                author,
                ingredients: ingredients.remove(&recipe.id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

pub async fn recipe_response(
    db: &SqlitePool,
    recipe: Recipe,
    viewer: Option<i64>,
) -> ApiResult<RecipeResponse> {
    single(recipe_responses(db, vec![recipe], viewer).await?)
}

/// Followed authors with their recipe previews
///
/// `recipes_limit: None` includes every recipe of each author.
pub async fn subscription_responses(
    db: &SqlitePool,
    authors: Vec<User>,
    viewer: i64,
    recipes_limit: Option<i64>,
) -> ApiResult<Vec<SubscriptionResponse>> {
    let author_ids = distinct(authors.iter().map(|author| author.id));
    let mut previews = recipes::recipes_by_authors(db, &author_ids, recipes_limit).await?;
    let counts = recipes::count_recipes_by_authors(db, &author_ids).await?;

    Ok(user_responses(db, authors, Some(viewer))
        .await?
        .into_iter()
        .map(|author| SubscriptionResponse {
            recipes: previews
                .remove(&author.id)
                .unwrap_or_default()
                .into_iter()
                .map(RecipeShort::from)
                .collect(),
            recipes_count: counts.get(&author.id).copied().unwrap_or(0),
            author,
        })
        .collect())
}

pub async fn subscription_response(
    db: &SqlitePool,
    author: User,
    viewer: i64,
    recipes_limit: Option<i64>,
) -> ApiResult<SubscriptionResponse> {
    single(subscription_responses(db, vec![author], viewer, recipes_limit).await?)
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i64,
}

/// Body of recipe create (POST) and update (PATCH)
///
/// Every field is optional at the JSON level so that missing fields are
/// reported per field by [`RecipeWrite::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeWrite {
    #[serde(default)]
    pub ingredients: Option<Vec<IngredientAmount>>,
    #[serde(default)]
    pub tags: Option<Vec<i64>>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub cooking_time: Option<i64>,
}

/// A [`RecipeWrite`] that passed validation
#[derive(Debug, Clone)]
pub struct ValidRecipe {
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
    /// (ingredient id, amount) in request order
    pub ingredients: Vec<(i64, i64)>,
    pub tag_ids: Vec<i64>,
}

const REQUIRED: &str = "This field is required";

impl RecipeWrite {
    /// Check every field and collect all problems at once
    ///
    /// `image` is mandatory only when `require_image` is set (create).
    pub fn validate(self, require_image: bool) -> ApiResult<ValidRecipe> {
        let mut errors = FieldErrors::new();

        let name = self.name.unwrap_or_default().trim().to_string();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        } else if name.chars().count() > MAX_RECIPE_NAME_LEN {
            errors.add(
                "name",
                format!("Ensure this field has no more than {} characters", MAX_RECIPE_NAME_LEN),
            );
        }

        let text = self.text.unwrap_or_default();
        if text.trim().is_empty() {
            errors.add("text", REQUIRED);
        }

        let image = self.image.filter(|image| !image.trim().is_empty());
        if require_image && image.is_none() {
            errors.add("image", REQUIRED);
        }

        let cooking_time = match self.cooking_time {
            None => {
                errors.add("cooking_time", REQUIRED);
                0
            }
            Some(minutes) if minutes < 1 => {
                errors.add("cooking_time", "Cooking time must be at least 1 minute");
                minutes
            }
            Some(minutes) if minutes > MAX_QUANTITY => {
                errors.add(
                    "cooking_time",
                    format!("Cooking time must be at most {} minutes", MAX_QUANTITY),
                );
                minutes
            }
            Some(minutes) => minutes,
        };

        let ingredients = self.ingredients.unwrap_or_default();
        if ingredients.is_empty() {
            errors.add("ingredients", "At least one ingredient is required");
        }
        let mut seen = HashSet::new();
        for item in &ingredients {
            if !seen.insert(item.id) {
                errors.add("ingredients", format!("Ingredient {} is listed more than once", item.id));
            }
            if item.amount < 1 {
                errors.add("ingredients", format!("Amount of ingredient {} must be at least 1", item.id));
            } else if item.amount > MAX_QUANTITY {
                errors.add(
                    "ingredients",
                    format!("Amount of ingredient {} must be at most {}", item.id, MAX_QUANTITY),
                );
            }
        }

        let tag_ids = self.tags.unwrap_or_default();
        if tag_ids.is_empty() {
            errors.add("tags", "At least one tag is required");
        }
        let mut seen = HashSet::new();
        for id in &tag_ids {
            if !seen.insert(*id) {
                errors.add("tags", format!("Tag {} is listed more than once", id));
            }
        }

        errors.into_result()?;

        Ok(ValidRecipe {
            name,
            image,
            text,
            cooking_time,
            ingredients: ingredients.iter().map(|item| (item.id, item.amount)).collect(),
            tag_ids,
        })
    }
}
