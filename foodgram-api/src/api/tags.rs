//! Tag endpoints (read-only)

use axum::{
    extract::State,
    Json,
};
use foodgram_common::db::Tag;

use super::extract::Path;
use crate::db::tags;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// GET /api/tags/
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(tags::list_tags(&state.db).await?))
}

/// GET /api/tags/:id/
pub async fn get_tag(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Tag>> {
    tags::get_tag(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Tag {}", id)))
}
