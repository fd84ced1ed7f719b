//! Monthly budget operations

use serde_json::json;
use tracing::debug;

use super::{from_row, from_rows, FinanceClient, BUDGET_CONFLICT};
use crate::backend::{Backend, Query, Table};
use crate::error::Result;
use crate::models::{Budget, BudgetMap};
use crate::period::YearMonth;

impl FinanceClient {
    /// Budget amounts for a month keyed by category name
    pub async fn get_budgets(&self, month: YearMonth) -> Result<BudgetMap> {
        let user_id = self.user_id().await?;
        let query = Query::new()
            .eq("user_id", &user_id)
            .eq("month", month.month())
            .eq("year", month.year());
        let budgets: Vec<Budget> = from_rows(self.backend.select(Table::Budgets, &query).await?)?;
        debug!(month = %month, count = budgets.len(), "Fetched budgets");
        Ok(budgets
            .into_iter()
            .map(|b| (b.category_name, b.amount))
            .collect())
    }

    /// Create or replace one category's budget for a month
    pub async fn set_budget(&self, category: &str, amount: f64, month: YearMonth) -> Result<Budget> {
        let user_id = self.user_id().await?;
        self.upsert_budget(&user_id, category, amount, month).await
    }

    async fn upsert_budget(
        &self,
        user_id: &str,
        category: &str,
        amount: f64,
        month: YearMonth,
    ) -> Result<Budget> {
        let row = json!({
            "user_id": user_id,
            "category_name": category,
            "amount": amount,
            "month": month.month(),
            "year": month.year(),
        });
        from_row(self.backend.upsert(Table::Budgets, row, BUDGET_CONFLICT).await?)
    }

    /// Save every positive amount in `budgets` for a month
    ///
    /// Entries are written one at a time in category order. The first failure
    /// stops the run; entries written before it stay written. Returns the
    /// number of rows written.
    pub async fn set_bulk_budgets(&self, budgets: &BudgetMap, month: YearMonth) -> Result<usize> {
        let user_id = self.user_id().await?;
        let mut written = 0;
        for (category, amount) in budgets.iter().filter(|(_, amount)| **amount > 0.0) {
            self.upsert_budget(&user_id, category, *amount, month).await?;
            written += 1;
        }
        debug!(month = %month, written, "Saved budgets");
        Ok(written)
    }

    /// The previous month's budgets, for use as a starting point
    pub async fn copy_from_previous_month(&self, month: YearMonth) -> Result<BudgetMap> {
        self.get_budgets(month.prev()).await
    }
}
