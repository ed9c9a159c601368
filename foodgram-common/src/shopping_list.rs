//! Shopping-list aggregation
//!
//! Merges the ingredient quantities of every recipe in a cart into one line
//! per (ingredient name, measurement unit). Lines keep the order in which each
//! pair first appears in the input.

use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// File name offered for the downloaded list
pub const SHOPPING_LIST_FILE_NAME: &str = "shopping_list.txt";

/// One ingredient quantity of one recipe in the cart
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShoppingLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

impl ShoppingLine {
    pub fn new(name: impl Into<String>, measurement_unit: impl Into<String>, amount: i64) -> Self {
        Self {
            name: name.into(),
            measurement_unit: measurement_unit.into(),
            amount,
        }
    }
}

/// Aggregated total for one ingredient
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub amount: i64,
    pub measurement_unit: String,
}

impl std::fmt::Display for ShoppingItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} ({})", self.name, self.amount, self.measurement_unit)
    }
}

/// Sum amounts per (name, measurement_unit), stable by first appearance
///
/// A total that does not fit in `i64` is an error, never a wrapped value.
pub fn aggregate<I>(lines: I) -> Result<Vec<ShoppingItem>>
where
    I: IntoIterator<Item = ShoppingLine>,
{
    let mut items: Vec<ShoppingItem> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for line in lines {
        let key = (line.name, line.measurement_unit);
        match index.get(&key) {
            Some(&i) => {
                let item = &mut items[i];
                item.amount = item.amount.checked_add(line.amount).ok_or_else(|| {
                    Error::Internal(format!(
                        "Shopping list total for {} ({}) overflows",
                        item.name, item.measurement_unit
                    ))
                })?;
            }
            None => {
                index.insert(key.clone(), items.len());
                items.push(ShoppingItem {
                    name: key.0,
                    amount: line.amount,
                    measurement_unit: key.1,
                });
            }
        }
    }

    Ok(items)
}

/// Render items as text, one `<name> - <amount> (<unit>)` line each
pub fn render(items: &[ShoppingItem]) -> String {
    items.iter().map(|item| format!("{}\n", item)).collect()
}
