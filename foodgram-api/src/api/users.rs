//! User and subscription endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use foodgram_common::db::User;
use serde::Deserialize;
use tracing::info;

use super::auth::CurrentUser;
use super::extract::{Path, Query};
use super::dto::{
    subscription_response, subscription_responses, user_response, user_responses,
    SubscriptionResponse, UserResponse,
};
use crate::db::{subscriptions, users};
use crate::error::{ApiError, ApiResult};
use crate::pagination::{Page, PageQuery};
use crate::AppState;

/// `recipes_limit` caps the recipe preview of each followed author
#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimitQuery {
    pub recipes_limit: Option<i64>,
}

/// Negative limits behave like zero
fn preview_limit(recipes_limit: Option<i64>) -> Option<i64> {
    recipes_limit.map(|n| n.max(0))
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<i64>,
}

async fn find_user(state: &AppState, id: i64) -> ApiResult<User> {
    users::get_user(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User {}", id)))
}

/// GET /api/users/?page&limit
pub async fn list_users(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Page<UserResponse>>> {
    let total = users::count_users(&state.db).await?;
    let pagination = query.paginate(total);
    let rows = users::list_users(&state.db, pagination.page_size, pagination.offset).await?;

    let results = user_responses(&state.db, rows, current.id()).await?;

    Ok(Json(Page::new(total, pagination, results)))
}

/// GET /api/users/:id/
pub async fn get_user(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserResponse>> {
    let user = find_user(&state, id).await?;
    Ok(Json(user_response(&state.db, user, current.id()).await?))
}

/// GET /api/users/me/
pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<UserResponse>> {
    let user = current.require()?.clone();
    let viewer = user.id;
    Ok(Json(user_response(&state.db, user, Some(viewer)).await?))
}

/// GET /api/users/subscriptions/?page&limit&recipes_limit
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<SubscriptionsQuery>,
) -> ApiResult<Json<Page<SubscriptionResponse>>> {
    let user = current.require()?;
    let recipes_limit = preview_limit(query.recipes_limit);
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let total = subscriptions::count_subscriptions(&state.db, user.id).await?;
    let pagination = page.paginate(total);
    let authors =
        subscriptions::subscribed_authors(&state.db, user.id, pagination.page_size, pagination.offset)
            .await?;

    let results = subscription_responses(&state.db, authors, user.id, recipes_limit).await?;

    Ok(Json(Page::new(total, pagination, results)))
}

/// POST /api/users/:id/subscribe/?recipes_limit
pub async fn subscribe(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(author_id): Path<i64>,
    Query(query): Query<RecipesLimitQuery>,
) -> ApiResult<(StatusCode, Json<SubscriptionResponse>)> {
    let user = current.require()?;
    let author = find_user(&state, author_id).await?;

    if author.id == user.id {
        return Err(ApiError::BadRequest("You cannot subscribe to yourself".to_string()));
    }
    if !subscriptions::subscribe(&state.db, user.id, author.id).await? {
        return Err(ApiError::Conflict(format!(
            "Already subscribed to user {}",
            author.id
        )));
    }

    info!(user_id = user.id, author_id = author.id, "Subscribed");
    let recipes_limit = preview_limit(query.recipes_limit);
    let body = subscription_response(&state.db, author, user.id, recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// DELETE /api/users/:id/subscribe/
pub async fn unsubscribe(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(author_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let user = current.require()?;
    let author = find_user(&state, author_id).await?;

    if !subscriptions::unsubscribe(&state.db, user.id, author.id).await? {
        return Err(ApiError::NotFound(format!(
            "Not subscribed to user {}",
            author.id
        )));
    }

    info!(user_id = user.id, author_id = author.id, "Unsubscribed");
    Ok(StatusCode::NO_CONTENT)
}
