//! Budget screen controller
//!
//! Ties the month cursor to the budget store. Loading a month that has no
//! budgets asks the backend to generate them from the recurring templates
//! and loads again. Generation is best effort: a failure becomes an info
//! notice and the month simply shows no budgets.

use tracing::info;

use crate::api::FinanceClient;
use crate::budget::{summarize_budget, BudgetSummary};
use crate::insights::{budget_insights, BudgetInsight};
use crate::models::{BudgetMap, Transaction};
use crate::period::{Direction, MonthCursor, YearMonth};

use super::{BudgetStore, Notice, StoreStatus};

pub struct BudgetView {
    client: FinanceClient,
    cursor: MonthCursor,
    budgets: BudgetStore,
}

impl BudgetView {
    pub fn new(client: FinanceClient, month: YearMonth) -> Self {
        Self {
            budgets: BudgetStore::new(client.clone()),
            client,
            cursor: MonthCursor::new(month),
        }
    }

    /// Month being viewed
    pub fn month(&self) -> YearMonth {
        self.cursor.current()
    }

    pub fn budgets(&self) -> &BudgetMap {
        self.budgets.budgets()
    }

    /// Whether the loaded budgets belong to the viewed month
    pub fn is_loaded(&self) -> bool {
        self.budgets.loaded_for() == Some(self.month())
    }

    pub fn status(&self) -> &StoreStatus {
        self.budgets.status()
    }

    pub fn status_mut(&mut self) -> &mut StoreStatus {
        self.budgets.status_mut()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.budgets.status_mut().take_notices()
    }

    /// Load the viewed month, generating from templates when it is empty
    pub async fn load(&mut self) {
        let month = self.month();
        if !self.budgets.fetch(month).await || !self.budgets.budgets().is_empty() {
            return;
        }

        match self.client.generate_monthly_budgets(month).await {
            Ok(()) => {
                if self.budgets.fetch(month).await && !self.budgets.budgets().is_empty() {
                    self.budgets
                        .status_mut()
                        .notify(Notice::success("Budget generated from recurring templates"));
                }
            }
            Err(e) => {
                info!(month = %month, error = %e, "No budgets generated from templates");
                self.budgets.status_mut().notify(Notice::info(format!(
                    "No recurring budgets applied for {}",
                    month.label()
                )));
            }
        }
    }

    /// Load only if the viewed month is not loaded yet
    pub async fn ensure_loaded(&mut self) {
        if !self.is_loaded() {
            self.load().await;
        }
    }

    /// Move to the previous or next month and load it
    pub async fn navigate(&mut self, direction: Direction) -> YearMonth {
        let month = self.cursor.step(direction);
        self.budgets.clear();
        self.load().await;
        month
    }

    pub async fn jump_to(&mut self, month: YearMonth) {
        self.cursor.jump_to(month);
        self.budgets.clear();
        self.load().await;
    }

    pub fn summary(&self, transactions: &[Transaction]) -> BudgetSummary {
        summarize_budget(transactions, self.budgets.budgets(), self.month())
    }

    pub fn insights(&self, transactions: &[Transaction]) -> Vec<BudgetInsight> {
        budget_insights(&self.summary(transactions))
    }

    pub async fn set_budget(&mut self, category: &str, amount: f64) -> bool {
        let month = self.month();
        self.budgets.set(category, amount, month).await
    }

    /// Save an edited budget map for the viewed month
    pub async fn save(&mut self, budgets: &BudgetMap) -> bool {
        let month = self.month();
        let saved = self.budgets.set_bulk(budgets, month).await;
        if saved {
            self.budgets
                .status_mut()
                .notify(Notice::success("Budget saved successfully"));
        }
        saved
    }

    /// Previous month's budgets as a draft for the viewed month
    pub async fn copy_previous(&mut self) -> BudgetMap {
        let month = self.month();
        let previous = self.budgets.previous_month(month).await;
        if self.budgets.status().error().is_some() {
            return previous;
        }
        let notice = if previous.is_empty() {
            Notice::info("No budget found for previous month")
        } else {
            Notice::success("Budget copied from previous month")
        };
        self.budgets.status_mut().notify(notice);
        previous
    }
}
