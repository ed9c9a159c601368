//! Ingredient database operations

use super::{missing_ids, placeholders};
use foodgram_common::db::{Ingredient, NewIngredient};
use sqlx::{SqliteConnection, SqlitePool};

/// All ingredients ordered by name, optionally narrowed to a name prefix
///
/// Prefix matching is case-insensitive for any script, so it is done here
/// rather than with SQLite's ASCII-only `LIKE`.
pub async fn list_ingredients(
    pool: &SqlitePool,
    name_prefix: Option<&str>,
) -> sqlx::Result<Vec<Ingredient>> {
    let ingredients = sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients ORDER BY name, id",
    )
    .fetch_all(pool)
    .await?;

    let prefix = match name_prefix.map(str::trim) {
        Some(prefix) if !prefix.is_empty() => prefix.to_lowercase(),
        _ => return Ok(ingredients),
    };

    Ok(ingredients
        .into_iter()
        .filter(|i| i.name.to_lowercase().starts_with(&prefix))
        .collect())
}

pub async fn get_ingredient(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Ingredient>> {
    sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Ids among `ids` that have no ingredient row
pub async fn missing_ingredient_ids(
    conn: &mut SqliteConnection,
    ids: &[i64],
) -> sqlx::Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let sql = format!(
        "SELECT id FROM ingredients WHERE id IN ({})",
        placeholders(ids.len())
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    let found = query.fetch_all(&mut *conn).await?;

    Ok(missing_ids(ids, &found))
}

/// Insert an ingredient unless the (name, unit) pair exists
///
/// Returns true when a row was inserted.
pub async fn get_or_create_ingredient(
    conn: &mut SqliteConnection,
    ingredient: &NewIngredient,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO ingredients (name, measurement_unit) VALUES (?, ?) ON CONFLICT(name, measurement_unit) DO NOTHING",
    )
    .bind(&ingredient.name)
    .bind(&ingredient.measurement_unit)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
