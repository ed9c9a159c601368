//! Repository layer: one module of query functions per entity
//!
//! Reads take the pool; writes that must be atomic with other writes take a
//! connection so callers can run them inside a transaction.

pub mod favorites;
pub mod ingredients;
pub mod recipes;
pub mod shopping_cart;
pub mod subscriptions;
pub mod tags;
pub mod users;

use sqlx::{QueryBuilder, Sqlite};

/// `?, ?, ?` for an `IN (...)` list of `n` bound values
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Append `(?, ?, ...)` binding every id; callers guard against an empty list
pub(crate) fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    qb.push("(");
    let mut list = qb.separated(", ");
    for id in ids {
        list.push_bind(*id);
    }
    list.push_unseparated(")");
}

/// Ids from `wanted` that are missing from `found`, in request order
pub(crate) fn missing_ids(wanted: &[i64], found: &[i64]) -> Vec<i64> {
    wanted
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}
