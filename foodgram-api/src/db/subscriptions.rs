//! Author subscriptions
//!
//! A subscription row is (user_id = follower, author_id = followed). Storage
//! rejects self-subscription with a CHECK constraint; handlers catch it first
//! to give a clearer message.

use foodgram_common::db::User;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;

use super::push_id_list;

/// Returns false when the user already follows the author
pub async fn subscribe(pool: &SqlitePool, user_id: i64, author_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT INTO subscriptions (user_id, author_id) VALUES (?, ?) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(author_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns false when there was no subscription
pub async fn unsubscribe(pool: &SqlitePool, user_id: i64, author_id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND author_id = ?")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Which of `author_ids` the user follows
pub async fn subscribed_among(
    pool: &SqlitePool,
    user_id: i64,
    author_ids: &[i64],
) -> sqlx::Result<HashSet<i64>> {
    if author_ids.is_empty() {
        return Ok(HashSet::new());
    }

    let mut qb =
        QueryBuilder::<Sqlite>::new("SELECT author_id FROM subscriptions WHERE user_id = ");
    qb.push_bind(user_id);
    qb.push(" AND author_id IN ");
    push_id_list(&mut qb, author_ids);

    let ids = qb.build_query_scalar::<i64>().fetch_all(pool).await?;
    Ok(ids.into_iter().collect())
}

pub async fn count_subscriptions(pool: &SqlitePool, user_id: i64) -> sqlx::Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Authors the user follows, in subscription order
pub async fn subscribed_authors(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.first_name, u.last_name
        FROM subscriptions s
        JOIN users u ON u.id = s.author_id
        WHERE s.user_id = ?
        ORDER BY s.id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
