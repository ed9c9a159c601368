//! Database models
//!
//! Plain row structs; per-entity queries live in the service's repository
//! modules.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{Error, Result};

pub const MAX_USERNAME_LEN: usize = 150;
pub const MAX_PERSON_NAME_LEN: usize = 150;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MAX_TAG_NAME_LEN: usize = 200;
pub const MAX_SLUG_LEN: usize = 200;
pub const MAX_INGREDIENT_NAME_LEN: usize = 200;
pub const MAX_UNIT_LEN: usize = 20;
pub const MAX_RECIPE_NAME_LEN: usize = 200;

/// Upper bound for ingredient amounts and cooking times (small integers)
pub const MAX_QUANTITY: i64 = 32767;

/// Non-empty (after trimming) and at most `max` characters
fn check_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} must not be empty", field)));
    }
    if value.chars().count() > max {
        return Err(Error::InvalidInput(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// `#` followed by exactly six hex digits
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// User fields as supplied by the identity component
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        check_text("username", &self.username, MAX_USERNAME_LEN)?;
        check_text("email", &self.email, MAX_EMAIL_LEN)?;
        if !self.email.contains('@') {
            return Err(Error::InvalidInput(format!(
                "'{}' is not an email address",
                self.email
            )));
        }
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.chars().count() > MAX_PERSON_NAME_LEN {
                return Err(Error::InvalidInput(format!(
                    "{} must be at most {} characters",
                    field, MAX_PERSON_NAME_LEN
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Tag as found in a reference data file
#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    #[serde(default = "default_tag_color")]
    pub color: String,
    pub slug: String,
}

fn default_tag_color() -> String {
    "#ffffff".to_string()
}

impl NewTag {
    pub fn validate(&self) -> Result<()> {
        check_text("tag name", &self.name, MAX_TAG_NAME_LEN)?;
        check_text("tag slug", &self.slug, MAX_SLUG_LEN)?;
        if !is_hex_color(&self.color) {
            return Err(Error::InvalidInput(format!(
                "tag color '{}' is not of the form #RRGGBB",
                self.color
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

/// Ingredient as found in a reference data file
#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

impl NewIngredient {
    pub fn validate(&self) -> Result<()> {
        check_text("ingredient name", &self.name, MAX_INGREDIENT_NAME_LEN)?;
        check_text("measurement unit", &self.measurement_unit, MAX_UNIT_LEN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: NaiveDateTime,
}

/// Junction row joined with its ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct RecipeIngredient {
    /// Ingredient id
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}
