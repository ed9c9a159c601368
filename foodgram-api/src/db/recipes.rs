//! Recipe database operations
//!
//! A recipe owns its junction rows (`recipe_ingredients`, `recipe_tags`).
//! Writes go through a connection so the recipe row and its junction rows
//! can share one transaction.

use foodgram_common::db::{Recipe, RecipeIngredient};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;

use super::push_id_list;

const RECIPE_COLUMNS: &str = "r.id AS id, r.author_id AS author_id, r.name AS name, \
     r.image AS image, r.text AS text, r.cooking_time AS cooking_time, r.pub_date AS pub_date";

/// Newest first; ids break ties between recipes published in the same second
const RECIPE_ORDER: &str = " ORDER BY r.pub_date DESC, r.id DESC";

/// List filters; all set conditions must hold
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches when it carries any of them
    pub tags: Vec<String>,
    /// Only recipes this user marked as favorite
    pub favorited_by: Option<i64>,
    /// Only recipes in this user's shopping cart
    pub in_cart_of: Option<i64>,
}

/// Scalar fields of a new recipe
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

/// Scalar fields of an update; `image: None` keeps the stored image
#[derive(Debug, Clone)]
pub struct RecipeUpdate {
    pub name: String,
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i64,
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &RecipeFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(author) = filter.author {
        qb.push(" AND r.author_id = ").push_bind(author);
    }

    if !filter.tags.is_empty() {
        qb.push(
            " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt \
             JOIN tags t ON t.id = rt.tag_id WHERE t.slug IN (",
        );
        let mut slugs = qb.separated(", ");
        for slug in &filter.tags {
            slugs.push_bind(slug.clone());
        }
        slugs.push_unseparated("))");
    }

    if let Some(user) = filter.favorited_by {
        qb.push(" AND r.id IN (SELECT recipe_id FROM favorites WHERE user_id = ")
            .push_bind(user)
            .push(")");
    }

    if let Some(user) = filter.in_cart_of {
        qb.push(" AND r.id IN (SELECT recipe_id FROM shopping_cart WHERE user_id = ")
            .push_bind(user)
            .push(")");
    }
}

pub async fn count_recipes(pool: &SqlitePool, filter: &RecipeFilter) -> sqlx::Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM recipes r");
    push_filter(&mut qb, filter);
    qb.build_query_scalar::<i64>().fetch_one(pool).await
}

/// One page of recipes matching `filter`, newest first
pub async fn list_recipes(
    pool: &SqlitePool,
    filter: &RecipeFilter,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Recipe>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM recipes r", RECIPE_COLUMNS));
    push_filter(&mut qb, filter);
    qb.push(RECIPE_ORDER);
    qb.push(" LIMIT ").push_bind(limit);
    qb.push(" OFFSET ").push_bind(offset);

    qb.build_query_as::<Recipe>().fetch_all(pool).await
}

pub async fn get_recipe(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Recipe>> {
    sqlx::query_as::<_, Recipe>(&format!(
        "SELECT {} FROM recipes r WHERE r.id = ?",
        RECIPE_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Newest recipes of each author in `author_ids`, at most `limit` each
///
/// `limit: None` returns every recipe. Authors without recipes have no entry.
pub async fn recipes_by_authors(
    pool: &SqlitePool,
    author_ids: &[i64],
    limit: Option<i64>,
) -> sqlx::Result<HashMap<i64, Vec<Recipe>>> {
    let mut by_author: HashMap<i64, Vec<Recipe>> = HashMap::new();
    if author_ids.is_empty() {
        return Ok(by_author);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT {} FROM (SELECT *, ROW_NUMBER() OVER \
         (PARTITION BY author_id ORDER BY pub_date DESC, id DESC) AS position \
         FROM recipes WHERE author_id IN ",
        RECIPE_COLUMNS
    ));
    push_id_list(&mut qb, author_ids);
    qb.push(") r");
    if let Some(limit) = limit {
        qb.push(" WHERE r.position <= ").push_bind(limit);
    }
    qb.push(RECIPE_ORDER);

    for recipe in qb.build_query_as::<Recipe>().fetch_all(pool).await? {
        by_author.entry(recipe.author_id).or_default().push(recipe);
    }

    Ok(by_author)
}

/// Recipe count per author; authors without recipes have no entry
pub async fn count_recipes_by_authors(
    pool: &SqlitePool,
    author_ids: &[i64],
) -> sqlx::Result<HashMap<i64, i64>> {
    if author_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb =
        QueryBuilder::<Sqlite>::new("SELECT author_id, COUNT(*) FROM recipes WHERE author_id IN ");
    push_id_list(&mut qb, author_ids);
    qb.push(" GROUP BY author_id");

    let rows = qb.build_query_as::<(i64, i64)>().fetch_all(pool).await?;
    Ok(rows.into_iter().collect())
}

/// Ingredients of each recipe in `recipe_ids` with their amounts, in
/// insertion order
pub async fn ingredients_for_recipes(
    pool: &SqlitePool,
    recipe_ids: &[i64],
) -> sqlx::Result<HashMap<i64, Vec<RecipeIngredient>>> {
    let mut by_recipe: HashMap<i64, Vec<RecipeIngredient>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(by_recipe);
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "SELECT ri.recipe_id, i.id, i.name, i.measurement_unit, ri.amount \
         FROM recipe_ingredients ri JOIN ingredients i ON i.id = ri.ingredient_id \
         WHERE ri.recipe_id IN ",
    );
    push_id_list(&mut qb, recipe_ids);
    qb.push(" ORDER BY ri.id");

    let rows = qb
        .build_query_as::<(i64, i64, String, String, i64)>()
        .fetch_all(pool)
        .await?;
    for (recipe_id, id, name, measurement_unit, amount) in rows {
        by_recipe.entry(recipe_id).or_default().push(RecipeIngredient {
            id,
            name,
            measurement_unit,
            amount,
        });
    }

    Ok(by_recipe)
}

/// Insert the recipe row and return its id
pub async fn insert_recipe(conn: &mut SqliteConnection, recipe: &NewRecipe) -> sqlx::Result<i64> {
    let result = sqlx::query(
        "INSERT INTO recipes (author_id, name, image, text, cooking_time) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(recipe.author_id)
    .bind(&recipe.name)
    .bind(&recipe.image)
    .bind(&recipe.text)
    .bind(recipe.cooking_time)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_recipe(
    conn: &mut SqliteConnection,
    id: i64,
    update: &RecipeUpdate,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE recipes
        SET name = ?, image = COALESCE(?, image), text = ?, cooking_time = ?
        WHERE id = ?
        "#,
    )
    .bind(&update.name)
    .bind(&update.image)
    .bind(&update.text)
    .bind(update.cooking_time)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Replace the full set of (ingredient id, amount) rows of a recipe
pub async fn replace_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    items: &[(i64, i64)],
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if items.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(
        "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ",
    );
    qb.push_values(items, |mut row, (ingredient_id, amount)| {
        row.push_bind(recipe_id)
            .push_bind(*ingredient_id)
            .push_bind(*amount);
    });
    qb.build().execute(&mut *conn).await?;

    Ok(())
}

/// Replace the full tag set of a recipe
pub async fn replace_tags(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    tag_ids: &[i64],
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    if tag_ids.is_empty() {
        return Ok(());
    }

    let mut qb = QueryBuilder::<Sqlite>::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    qb.push_values(tag_ids, |mut row, tag_id| {
        row.push_bind(recipe_id).push_bind(*tag_id);
    });
    qb.build().execute(&mut *conn).await?;

    Ok(())
}

/// Delete a recipe; junction rows, favorites and cart entries cascade
pub async fn delete_recipe(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
