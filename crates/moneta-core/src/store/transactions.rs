//! Transaction list state

use crate::api::FinanceClient;
use crate::models::{NewTransaction, Transaction, TransactionUpdate};

use super::StoreStatus;

/// The user's transactions, newest first
pub struct TransactionStore {
    client: FinanceClient,
    transactions: Vec<Transaction>,
    status: StoreStatus,
}

impl TransactionStore {
    pub fn new(client: FinanceClient) -> Self {
        Self {
            client,
            transactions: Vec::new(),
            status: StoreStatus::default(),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn status(&self) -> &StoreStatus {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut StoreStatus {
        &mut self.status
    }

    /// Replace the local list with the backend's
    pub async fn fetch(&mut self) {
        self.status.begin(true);
        match self.client.list_transactions().await {
            Ok(transactions) => {
                self.transactions = transactions;
                self.status.finish();
            }
            Err(e) => self.status.fail("load transactions", &e),
        }
    }

    /// Add a transaction and put it at the front of the list
    pub async fn add(&mut self, transaction: &NewTransaction) -> Option<Transaction> {
        self.status.begin(false);
        match self.client.add_transaction(transaction).await {
            Ok(added) => {
                self.transactions.insert(0, added.clone());
                Some(added)
            }
            Err(e) => {
                self.status.fail("add transaction", &e);
                None
            }
        }
    }

    /// Update a transaction; the local copy takes the same changes
    pub async fn update(&mut self, id: &str, update: &TransactionUpdate) -> bool {
        self.status.begin(false);
        match self.client.update_transaction(id, update).await {
            Ok(_) => {
                if let Some(t) = self.transactions.iter_mut().find(|t| t.id == id) {
                    t.apply(update);
                }
                true
            }
            Err(e) => {
                self.status.fail("update transaction", &e);
                false
            }
        }
    }

    /// Delete a transaction; an id not in the local list leaves it unchanged
    pub async fn delete(&mut self, id: &str) -> bool {
        self.status.begin(false);
        match self.client.delete_transaction(id).await {
            Ok(()) => {
                self.transactions.retain(|t| t.id != id);
                true
            }
            Err(e) => {
                self.status.fail("delete transaction", &e);
                false
            }
        }
    }
}
