//! Tag database operations

use super::{missing_ids, placeholders, push_id_list};
use foodgram_common::db::{NewTag, Tag};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

pub async fn list_tags(pool: &SqlitePool) -> sqlx::Result<Vec<Tag>> {
    sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
}

pub async fn get_tag(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Tag>> {
    sqlx::query_as::<_, Tag>("SELECT id, name, color, slug FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Tags of each recipe in `recipe_ids`, ordered by tag id
///
/// Recipes without tags have no entry.
pub async fn tags_for_recipes(
    pool: &SqlitePool,
    recipe_ids: &[i64],
) -> sqlx::Result<HashMap<i64, Vec<Tag>>> {
    let mut by_recipe: HashMap<i64, Vec<Tag>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(by_recipe);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT rt.recipe_id, t.id, t.name, t.color, t.slug \
         FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id \
         WHERE rt.recipe_id IN ",
    );
    push_id_list(&mut qb, recipe_ids);
    qb.push(" ORDER BY rt.recipe_id, t.id");

    let rows = qb
        .build_query_as::<(i64, i64, String, String, String)>()
        .fetch_all(pool)
        .await?;
    for (recipe_id, id, name, color, slug) in rows {
        by_recipe
            .entry(recipe_id)
            .or_default()
            .push(Tag { id, name, color, slug });
    }

    Ok(by_recipe)
}

/// Ids among `ids` that have no tag row
pub async fn missing_tag_ids(conn: &mut SqliteConnection, ids: &[i64]) -> sqlx::Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!("SELECT id FROM tags WHERE id IN ({})", placeholders(ids.len()));
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let found = query.fetch_all(&mut *conn).await?;

    Ok(missing_ids(ids, &found))
}

/// Insert a tag unless one with the same name or slug exists
///
/// Returns true when a row was inserted.
pub async fn get_or_create_tag(conn: &mut SqliteConnection, tag: &NewTag) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO tags (name, color, slug) VALUES (?, ?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(&tag.name)
    .bind(&tag.color)
    .bind(&tag.slug)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
