//! Favorite recipes
//!
//! Marking is idempotent at the storage level: `add_favorite` reports whether
//! a row was actually inserted and the caller decides what a repeat means.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;

use super::push_id_list;

/// Returns false when the recipe was already a favorite
pub async fn add_favorite(pool: &SqlitePool, user_id: i64, recipe_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO favorites (user_id, recipe_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns false when there was nothing to remove
pub async fn remove_favorite(pool: &SqlitePool, user_id: i64, recipe_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM favorites WHERE user_id = ? AND recipe_id = ?")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Which of `recipe_ids` the user has marked as favorite
pub async fn favorited_among(
    pool: &SqlitePool,
    user_id: i64,
    recipe_ids: &[i64],
) -> sqlx::Result<HashSet<i64>> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new("SELECT recipe_id FROM favorites WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND recipe_id IN ");
    push_id_list(&mut qb, recipe_ids);

    let ids = qb.build_query_scalar::<i64>().fetch_all(pool).await?;
    Ok(ids.into_iter().collect())
}
