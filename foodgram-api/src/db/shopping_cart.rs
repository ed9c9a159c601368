//! Shopping cart entries and the raw lines behind the shopping list

use foodgram_common::ShoppingLine;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;

use super::push_id_list;

/// Returns false when the recipe was already in the cart
pub async fn add_to_cart(pool: &SqlitePool, user_id: i64, recipe_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO shopping_cart (user_id, recipe_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns false when there was nothing to remove
pub async fn remove_from_cart(pool: &SqlitePool, user_id: i64, recipe_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM shopping_cart WHERE user_id = ? AND recipe_id = ?")
        .bind(user_id)
        .bind(recipe_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Which of `recipe_ids` are in the user's cart
pub async fn in_cart_among(
    pool: &SqlitePool,
    user_id: i64,
    recipe_ids: &[i64],
) -> sqlx::Result<HashSet<i64>> {
    if recipe_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut qb =
        QueryBuilder::<Sqlite>::new("SELECT recipe_id FROM shopping_cart WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND recipe_id IN ");
    push_id_list(&mut qb, recipe_ids);

    let ids = qb.build_query_scalar::<i64>().fetch_all(pool).await?;
    Ok(ids.into_iter().collect())
}

/// Every ingredient quantity of every recipe in the user's cart
///
/// Ordered by when the recipe entered the cart, then by the recipe's own
/// ingredient order, so aggregation yields a stable list.
pub async fn shopping_lines(pool: &SqlitePool, user_id: i64) -> sqlx::Result<Vec<ShoppingLine>> {
    sqlx::query_as::<_, ShoppingLine>(
        r#"
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart sc
        JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE sc.user_id = ?
        ORDER BY sc.id, ri.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
