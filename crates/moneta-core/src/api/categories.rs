//! Category operations and default category seeding

use serde_json::{Map, Value};
use tracing::{info, warn};

use super::{first_row, from_row, from_rows, owned_row, FinanceClient};
use crate::backend::{Backend, Order, Query, Table};
use crate::defaults::{default_categories, missing_defaults};
use crate::error::{Error, Result};
use crate::models::{Category, CategoryUpdate, NewCategory};

/// Tables that reference categories by name
const NAME_REFERENCES: [(Table, &str); 3] = [
    (Table::Transactions, "category"),
    (Table::Budgets, "category_name"),
    (Table::RecurringBudgets, "category_name"),
];

impl FinanceClient {
    /// The user's categories ordered by name
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let user_id = self.user_id().await?;
        let query = Query::new()
            .eq("user_id", &user_id)
            .order("name", Order::Asc);
        from_rows(self.backend.select(Table::Categories, &query).await?)
    }

    async fn get_category(&self, id: &str, user_id: &str) -> Result<Category> {
        let query = Query::new().eq("id", id).eq("user_id", user_id);
        let rows = self.backend.select(Table::Categories, &query).await?;
        from_row(first_row(rows, || format!("Category {}", id))?)
    }

    /// Add a user category (never a system one)
    pub async fn add_category(&self, category: &NewCategory) -> Result<Category> {
        let name = category.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Category name cannot be empty".into()));
        }
        let user_id = self.user_id().await?;
        let mut row = owned_row(category, &user_id)?;
        row["name"] = Value::String(name.to_string());
        row["is_system"] = Value::Bool(false);
        let rows = self.backend.insert(Table::Categories, vec![row]).await?;
        from_row(first_row(rows, || "inserted category".into())?)
    }

    /// Update a category
    ///
    /// A rename is carried over to transactions, budgets, and recurring
    /// templates that referenced the old name. That follow-up is best effort:
    /// failures are logged and the category update still stands.
    pub async fn update_category(&self, id: &str, update: &CategoryUpdate) -> Result<Category> {
        let user_id = self.user_id().await?;
        let before = self.get_category(id, &user_id).await?;

        let filters = Query::new().eq("id", id).eq("user_id", &user_id);
        let rows = self
            .backend
            .update(Table::Categories, &filters, serde_json::to_value(update)?)
            .await?;
        let updated: Category = from_row(first_row(rows, || format!("Category {}", id))?)?;

        if updated.name != before.name {
            self.rename_references(&user_id, &before.name, &updated.name)
                .await;
        }
        Ok(updated)
    }

    async fn rename_references(&self, user_id: &str, old: &str, new: &str) {
        for (table, column) in NAME_REFERENCES {
            let filters = Query::new().eq("user_id", user_id).eq(column, old);
            let mut patch = Map::new();
            patch.insert(column.to_string(), Value::String(new.to_string()));
            match self
                .backend
                .update(table, &filters, Value::Object(patch))
                .await
            {
                Ok(rows) if !rows.is_empty() => {
                    info!(
                        table = %table,
                        count = rows.len(),
                        from = old,
                        to = new,
                        "Renamed category references"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(
                        table = %table,
                        from = old,
                        error = %e,
                        "Failed to rename category references"
                    );
                }
            }
        }
    }

    /// Delete a user category; system categories are refused
    pub async fn delete_category(&self, id: &str) -> Result<()> {
        let user_id = self.user_id().await?;
        let category = self.get_category(id, &user_id).await?;
        if category.is_system {
            return Err(Error::InvalidData(format!(
                "'{}' is a default category and cannot be deleted",
                category.name
            )));
        }
        let filters = Query::new().eq("id", id).eq("user_id", &user_id);
        self.backend.delete(Table::Categories, &filters).await
    }

    /// Seed the full default catalog for a user who has no categories yet
    ///
    /// Returns the number of categories created.
    pub async fn setup_default_categories(&self) -> Result<usize> {
        let existing = self.list_categories().await?;
        if !existing.is_empty() {
            return Ok(0);
        }
        self.insert_system_categories(default_categories()).await
    }

    /// Add whichever default categories the user is missing, by name
    pub async fn load_missing_default_categories(&self) -> Result<usize> {
        let existing = self.list_categories().await?;
        let missing = missing_defaults(existing.iter().map(|c| c.name.as_str()));
        if missing.is_empty() {
            return Ok(0);
        }
        self.insert_system_categories(missing).await
    }

    async fn insert_system_categories(&self, categories: Vec<NewCategory>) -> Result<usize> {
        let user_id = self.user_id().await?;
        let rows = categories
            .iter()
            .map(|category| {
                let mut row = owned_row(category, &user_id)?;
                row["is_system"] = Value::Bool(true);
                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;
        let inserted = self.backend.insert(Table::Categories, rows).await?;
        info!(count = inserted.len(), "Seeded default categories");
        Ok(inserted.len())
    }
}
