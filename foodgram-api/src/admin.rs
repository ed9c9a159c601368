//! Operator commands
//!
//! Reference-data loading and user provisioning, run from the `foodgram`
//! binary against the same database the service uses.

use foodgram_common::api::auth::{generate_token, issue_token};
use foodgram_common::db::{NewIngredient, NewTag, NewUser, User};
use foodgram_common::{Error, Result};
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

use crate::db::{ingredients, tags, users};

/// Outcome of a reference-data load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub created: usize,
    pub existing: usize,
}

impl LoadSummary {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.created += 1;
        } else {
            self.existing += 1;
        }
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Nothing is loaded when any entry is invalid
fn validate_all<T>(items: &[T], validate: impl Fn(&T) -> Result<()>) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        validate(item).map_err(|e| Error::InvalidInput(format!("entry {}: {}", i, e)))?;
    }
    Ok(())
}

/// Load `[{"name", "measurement_unit"}]`; existing rows are left untouched
pub async fn load_ingredients(pool: &SqlitePool, path: &Path) -> Result<LoadSummary> {
    let items: Vec<NewIngredient> = read_json(path).await?;
    validate_all(&items, NewIngredient::validate)?;
    let mut summary = LoadSummary::default();

    let mut tx = pool.begin().await?;
    for item in &items {
        summary.record(ingredients::get_or_create_ingredient(&mut tx, item).await?);
    }
    tx.commit().await?;

    info!(
        "Loaded ingredients from {}: {} created, {} already present",
        path.display(),
        summary.created,
        summary.existing
    );
    Ok(summary)
}

/// Load `[{"name", "color", "slug"}]`; existing rows are left untouched
pub async fn load_tags(pool: &SqlitePool, path: &Path) -> Result<LoadSummary> {
    let items: Vec<NewTag> = read_json(path).await?;
    validate_all(&items, NewTag::validate)?;
    let mut summary = LoadSummary::default();

    let mut tx = pool.begin().await?;
    for item in &items {
        summary.record(tags::get_or_create_tag(&mut tx, item).await?);
    }
    tx.commit().await?;

    info!(
        "Loaded tags from {}: {} created, {} already present",
        path.display(),
        summary.created,
        summary.existing
    );
    Ok(summary)
}

/// A provisioned user and the only copy of their API key
#[derive(Debug, Clone)]
pub struct CreatedUser {
    pub user: User,
    pub token: String,
}

/// Create a user and issue them an API key
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser) -> Result<CreatedUser> {
    new_user.validate()?;

    let user = users::create_user(pool, new_user).await?;
    let token = generate_token();
    issue_token(pool, user.id, &token)
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    info!(user_id = user.id, "Created user {}", user.username);
    Ok(CreatedUser { user, token })
}

/// Delete a user by username with everything they own
///
/// Returns false when no such user exists.
pub async fn delete_user(pool: &SqlitePool, username: &str) -> Result<bool> {
    let Some(user) = users::get_user_by_username(pool, username).await? else {
        return Ok(false);
    };

    let deleted = users::delete_user(pool, user.id).await?;
    if deleted {
        info!(user_id = user.id, "Deleted user {}", username);
    }
    Ok(deleted)
}
