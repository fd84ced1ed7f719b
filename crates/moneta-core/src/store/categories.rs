//! Category list state

use std::cmp::Ordering;

use tracing::debug;

use crate::api::FinanceClient;
use crate::models::{Category, CategoryUpdate, NewCategory, TransactionType};

use super::{Notice, StoreStatus};

/// Income categories first, then by name
fn display_order(a: &Category, b: &Category) -> Ordering {
    match (a.kind, b.kind) {
        (TransactionType::Income, TransactionType::Expense) => Ordering::Less,
        (TransactionType::Expense, TransactionType::Income) => Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
}

/// The user's categories in display order
pub struct CategoryStore {
    client: FinanceClient,
    categories: Vec<Category>,
    status: StoreStatus,
}

impl CategoryStore {
    pub fn new(client: FinanceClient) -> Self {
        Self {
            client,
            categories: Vec::new(),
            status: StoreStatus::default(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn by_kind(&self, kind: TransactionType) -> impl Iterator<Item = &Category> {
        self.categories.iter().filter(move |c| c.kind == kind)
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }

    /// Replace the local list; a failed load leaves it empty
    pub async fn fetch(&mut self) {
        self.status.begin(true);
        match self.client.list_categories().await {
            Ok(mut categories) => {
                categories.sort_by(display_order);
                debug!(
                    income = categories.iter().filter(|c| c.kind == TransactionType::Income).count(),
                    expense = categories.iter().filter(|c| c.kind == TransactionType::Expense).count(),
                    "Loaded categories"
                );
                self.categories = categories;
                self.status.finish();
            }
            Err(e) => {
                self.categories.clear();
                self.status.fail("load categories", &e);
            }
        }
    }

    pub async fn add(&mut self, category: &NewCategory) -> Option<Category> {
        self.status.begin(false);
        match self.client.add_category(category).await {
            Ok(added) => {
                self.categories.push(added.clone());
                self.categories.sort_by(display_order);
                Some(added)
            }
            Err(e) => {
                self.status.fail("add category", &e);
                None
            }
        }
    }

    pub async fn update(&mut self, id: &str, update: &CategoryUpdate) -> bool {
        self.status.begin(false);
        match self.client.update_category(id, update).await {
            Ok(_) => {
                if let Some(c) = self.categories.iter_mut().find(|c| c.id == id) {
                    c.apply(update);
                }
                self.categories.sort_by(display_order);
                true
            }
            Err(e) => {
                self.status.fail("update category", &e);
                false
            }
        }
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        self.status.begin(false);
        match self.client.delete_category(id).await {
            Ok(()) => {
                self.categories.retain(|c| c.id != id);
                true
            }
            Err(e) => {
                self.status.fail("delete category", &e);
                false
            }
        }
    }

    /// Seed default categories and reload
    ///
    /// With `all_missing` every default whose name is absent is added;
    /// otherwise the catalog is only seeded for a user with no categories.
    pub async fn seed_defaults(&mut self, all_missing: bool) -> usize {
        self.status.begin(false);
        let result = if all_missing {
            self.client.load_missing_default_categories().await
        } else {
            self.client.setup_default_categories().await
        };
        match result {
            Ok(0) => {
                self.status
                    .notify(Notice::info("All default categories are already present"));
                0
            }
            Ok(count) => {
                self.status
                    .notify(Notice::success(format!("Added {} default categories", count)));
                self.fetch().await;
                count
            }
            Err(e) => {
                self.status.fail("add default categories", &e);
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, kind: TransactionType) -> Category {
        Category {
            id: name.to_string(),
            name: name.to_string(),
            color: "#000".into(),
            kind,
            user_id: "u".into(),
            is_system: false,
        }
    }

    #[test]
    fn test_display_order_income_first() {
        let mut list = vec![
            category("rent", TransactionType::Expense),
            category("Salary", TransactionType::Income),
            category("Food", TransactionType::Expense),
            category("Bonus", TransactionType::Income),
        ];
        list.sort_by(display_order);
        let names: Vec<_> = list.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Bonus", "Salary", "Food", "rent"]);
    }
}
