//! Recurring budget template state

use crate::api::FinanceClient;
use crate::models::BudgetMap;
use crate::period::YearMonth;

use super::StoreStatus;

/// Active templates keyed by category name
pub struct RecurringStore {
    client: FinanceClient,
    templates: BudgetMap,
    status: StoreStatus,
}

impl RecurringStore {
    pub fn new(client: FinanceClient) -> Self {
        Self {
            client,
            templates: BudgetMap::new(),
            status: StoreStatus::default(),
        }
    }

    pub fn templates(&self) -> &BudgetMap {
        &self.templates
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }

    pub async fn fetch(&mut self) {
        self.status.begin(true);
        match self.client.get_recurring_budgets().await {
            Ok(templates) => {
                self.templates = templates;
                self.status.finish();
            }
            Err(e) => self.status.fail("load recurring budgets", &e),
        }
    }

    pub async fn set(&mut self, category: &str, amount: f64) -> bool {
        self.status.begin(false);
        match self.client.set_recurring_budget(category, amount).await {
            Ok(_) => {
                self.templates.insert(category.to_string(), amount);
                true
            }
            Err(e) => {
                self.status.fail("set recurring budget", &e);
                false
            }
        }
    }

    pub async fn set_bulk(&mut self, templates: &BudgetMap) -> bool {
        self.status.begin(false);
        match self.client.set_bulk_recurring_budgets(templates).await {
            Ok(_) => {
                self.templates = templates.clone();
                true
            }
            Err(e) => {
                self.status.fail("save recurring budgets", &e);
                false
            }
        }
    }

    pub async fn generate(&mut self, month: YearMonth) -> bool {
        self.status.begin(false);
        match self.client.generate_monthly_budgets(month).await {
            Ok(()) => true,
            Err(e) => {
                self.status.fail("generate monthly budgets", &e);
                false
            }
        }
    }

    pub async fn delete(&mut self, category: &str) -> bool {
        self.status.begin(false);
        match self.client.delete_recurring_budget(category).await {
            Ok(()) => {
                self.templates.remove(category);
                true
            }
            Err(e) => {
                self.status.fail("delete recurring budget", &e);
                false
            }
        }
    }
}
