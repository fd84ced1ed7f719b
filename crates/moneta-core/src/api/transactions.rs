//! Transaction operations

use tracing::debug;

use super::{first_row, from_row, from_rows, owned_row, FinanceClient};
use crate::backend::{Backend, Order, Query, Table};
use crate::error::{Error, Result};
use crate::models::{NewTransaction, Transaction, TransactionUpdate};

impl FinanceClient {
    /// All of the user's transactions, newest first
    pub async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let user_id = self.user_id().await?;
        let query = Query::new()
            .eq("user_id", &user_id)
            .order("date", Order::Desc);
        let rows = self.backend.select(Table::Transactions, &query).await?;
        debug!(count = rows.len(), "Fetched transactions");
        from_rows(rows)
    }

    /// Record a transaction; the amount is stored exactly as given
    pub async fn add_transaction(&self, transaction: &NewTransaction) -> Result<Transaction> {
        let user_id = self.user_id().await?;
        let row = owned_row(transaction, &user_id)?;
        let rows = self.backend.insert(Table::Transactions, vec![row]).await?;
        from_row(first_row(rows, || "inserted transaction".into())?)
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        update: &TransactionUpdate,
    ) -> Result<Transaction> {
        if update.is_empty() {
            return Err(Error::InvalidData("Nothing to update".into()));
        }
        let user_id = self.user_id().await?;
        let filters = Query::new().eq("id", id).eq("user_id", &user_id);
        let rows = self
            .backend
            .update(Table::Transactions, &filters, serde_json::to_value(update)?)
            .await?;
        from_row(first_row(rows, || format!("Transaction {}", id))?)
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        let user_id = self.user_id().await?;
        let filters = Query::new().eq("id", id).eq("user_id", &user_id);
        self.backend.delete(Table::Transactions, &filters).await
    }
}
