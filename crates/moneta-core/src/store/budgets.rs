//! Budget map state for one month at a time

use crate::api::FinanceClient;
use crate::models::BudgetMap;
use crate::period::YearMonth;

use super::StoreStatus;

/// Budgets of the month last loaded
pub struct BudgetStore {
    client: FinanceClient,
    budgets: BudgetMap,
    loaded_for: Option<YearMonth>,
    status: StoreStatus,
}

impl BudgetStore {
    pub fn new(client: FinanceClient) -> Self {
        Self {
            client,
            budgets: BudgetMap::new(),
            loaded_for: None,
            status: StoreStatus::default(),
        }
    }

    pub fn budgets(&self) -> &BudgetMap {
        &self.budgets
    }

    /// Month the current map belongs to
    pub fn loaded_for(&self) -> Option<YearMonth> {
        self.loaded_for
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }

    /// Drop the loaded budgets
    pub fn clear(&mut self) {
        self.budgets.clear();
        self.loaded_for = None;
    }

    /// Load a month's budgets; returns false on failure
    pub async fn fetch(&mut self, month: YearMonth) -> bool {
        self.status.begin(true);
        match self.client.get_budgets(month).await {
            Ok(budgets) => {
                self.budgets = budgets;
                self.loaded_for = Some(month);
                self.status.finish();
                true
            }
            Err(e) => {
                self.status.fail("load budgets", &e);
                false
            }
        }
    }

    pub async fn set(&mut self, category: &str, amount: f64, month: YearMonth) -> bool {
        self.status.begin(false);
        match self.client.set_budget(category, amount, month).await {
            Ok(_) => {
                if self.loaded_for == Some(month) {
                    self.budgets.insert(category.to_string(), amount);
                }
                true
            }
            Err(e) => {
                self.status.fail("set budget", &e);
                false
            }
        }
    }

    /// Save a whole map for a month and adopt it locally on success
    pub async fn set_bulk(&mut self, budgets: &BudgetMap, month: YearMonth) -> bool {
        self.status.begin(false);
        match self.client.set_bulk_budgets(budgets, month).await {
            Ok(_) => {
                self.budgets = budgets.clone();
                self.loaded_for = Some(month);
                true
            }
            Err(e) => {
                self.status.fail("save budgets", &e);
                false
            }
        }
    }

    /// The month before `month`, empty if it has none or the read fails
    pub async fn previous_month(&mut self, month: YearMonth) -> BudgetMap {
        self.status.begin(false);
        match self.client.copy_from_previous_month(month).await {
            Ok(previous) => previous,
            Err(e) => {
                self.status.fail("copy from previous month", &e);
                BudgetMap::new()
            }
        }
    }
}
