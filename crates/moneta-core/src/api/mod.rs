//! Typed access to the backend tables
//!
//! `FinanceClient` turns table rows into domain models. Every call is scoped
//! to the signed-in user and fails with `Error::NotAuthenticated` when there
//! is no session. Operations are split by entity across submodules.

mod budgets;
mod categories;
mod recurring;
mod settings;
mod transactions;

#[cfg(test)]
mod tests;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::backend::{Backend, BackendClient};
use crate::error::{Error, Result};

/// Conflict target for budget upserts
pub const BUDGET_CONFLICT: &[&str] = &["user_id", "category_name", "month", "year"];
/// Conflict target for recurring template upserts
pub const RECURRING_CONFLICT: &[&str] = &["user_id", "category_name"];
/// Conflict target for the settings singleton
pub const SETTINGS_CONFLICT: &[&str] = &["user_id"];

/// Per-entity operations over a backend
#[derive(Clone)]
pub struct FinanceClient {
    backend: BackendClient,
}

impl FinanceClient {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    async fn user_id(&self) -> Result<String> {
        self.backend.current_user_id().await
    }
}

/// Deserialize backend rows into models
fn from_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(Error::from))
        .collect()
}

fn from_row<T: DeserializeOwned>(row: Value) -> Result<T> {
    Ok(serde_json::from_value(row)?)
}

/// First returned row, or `NotFound` naming what was expected
fn first_row(rows: Vec<Value>, what: impl FnOnce() -> String) -> Result<Value> {
    rows.into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(what()))
}

/// Serialize a model and stamp it with its owner
fn owned_row<T: Serialize>(value: &T, user_id: &str) -> Result<Value> {
    let mut row = serde_json::to_value(value)?;
    match row.as_object_mut() {
        Some(map) => {
            map.insert("user_id".into(), Value::String(user_id.to_string()));
            Ok(row)
        }
        None => Err(Error::InvalidData("Expected a JSON object row".into())),
    }
}
