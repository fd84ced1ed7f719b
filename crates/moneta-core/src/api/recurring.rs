//! Recurring budget templates and monthly generation

use serde_json::json;
use tracing::{debug, info};

use super::{from_row, from_rows, FinanceClient, RECURRING_CONFLICT};
use crate::backend::{Backend, Query, Table};
use crate::error::Result;
use crate::models::{BudgetMap, RecurringBudget};
use crate::period::YearMonth;

/// Server-side function that copies active templates into a month
pub const GENERATE_MONTHLY_BUDGETS: &str = "generate_monthly_budgets";

impl FinanceClient {
    /// Active templates keyed by category name
    pub async fn get_recurring_budgets(&self) -> Result<BudgetMap> {
        let user_id = self.user_id().await?;
        let query = Query::new()
            .eq("user_id", &user_id)
            .eq("is_active", true);
        let templates: Vec<RecurringBudget> =
            from_rows(self.backend.select(Table::RecurringBudgets, &query).await?)?;
        Ok(templates
            .into_iter()
            .map(|t| (t.category_name, t.amount))
            .collect())
    }

    pub async fn set_recurring_budget(&self, category: &str, amount: f64) -> Result<RecurringBudget> {
        let user_id = self.user_id().await?;
        self.upsert_recurring(&user_id, category, amount).await
    }

    async fn upsert_recurring(
        &self,
        user_id: &str,
        category: &str,
        amount: f64,
    ) -> Result<RecurringBudget> {
        let row = json!({
            "user_id": user_id,
            "category_name": category,
            "amount": amount,
            "is_active": true,
        });
        from_row(
            self.backend
                .upsert(Table::RecurringBudgets, row, RECURRING_CONFLICT)
                .await?,
        )
    }

    /// Save every positive amount as an active template, stopping at the
    /// first failure
    pub async fn set_bulk_recurring_budgets(&self, templates: &BudgetMap) -> Result<usize> {
        let user_id = self.user_id().await?;
        let mut written = 0;
        for (category, amount) in templates.iter().filter(|(_, amount)| **amount > 0.0) {
            self.upsert_recurring(&user_id, category, *amount).await?;
            written += 1;
        }
        debug!(written, "Saved recurring budgets");
        Ok(written)
    }

    pub async fn delete_recurring_budget(&self, category: &str) -> Result<()> {
        let user_id = self.user_id().await?;
        let filters = Query::new()
            .eq("user_id", &user_id)
            .eq("category_name", category);
        self.backend.delete(Table::RecurringBudgets, &filters).await
    }

    /// Populate a month's budgets from the active templates
    ///
    /// Runs on the backend and is idempotent for a given month.
    pub async fn generate_monthly_budgets(&self, month: YearMonth) -> Result<()> {
        let user_id = self.user_id().await?;
        let args = json!({
            "p_user_id": user_id,
            "p_month": month.month(),
            "p_year": month.year(),
        });
        self.backend.rpc(GENERATE_MONTHLY_BUDGETS, args).await?;
        info!(month = %month, "Generated monthly budgets from templates");
        Ok(())
    }
}
