//! User database operations
//!
//! Users are created by the identity component; the service only reads them,
//! apart from the operator commands.

use foodgram_common::db::{NewUser, User};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::push_id_list;

const USER_COLUMNS: &str = "id, username, email, first_name, last_name";

/// Load user by id
pub async fn get_user(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Load every user in `ids`, in no particular order
pub async fn users_by_ids(pool: &SqlitePool, ids: &[i64]) -> sqlx::Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb =
        QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM users WHERE id IN ", USER_COLUMNS));
    push_id_list(&mut qb, ids);
    qb.build_query_as::<User>().fetch_all(pool).await
}

/// Load user by username
pub async fn get_user_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = ?",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn count_users(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

/// One page of users ordered by id
pub async fn list_users(pool: &SqlitePool, limit: i64, offset: i64) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users ORDER BY id LIMIT ? OFFSET ?",
        USER_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Insert a user; duplicate username or email fails with a unique violation
pub async fn create_user(pool: &SqlitePool, user: &NewUser) -> sqlx::Result<User> {
    let id = sqlx::query(
        "INSERT INTO users (username, email, first_name, last_name) VALUES (?, ?, ?, ?)",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(User {
        id,
        username: user.username.clone(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    })
}

/// Delete a user and, through cascades, everything they own
///
/// Returns false when no such user exists.
pub async fn delete_user(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
