//! Hosted backend abstraction
//!
//! Everything the app persists goes through a PostgREST-style table API
//! plus a GoTrue-style auth API. Two implementations:
//! - `RestBackend`: talks HTTP to a hosted project
//! - `MemoryBackend`: in-process tables with per-user row isolation, used
//!   for tests, the offline CLI mode, and the mock REST server
//!
//! `BackendClient` wraps either one behind a single concrete type.

mod memory;
mod rest;

pub use memory::{MemoryBackend, MemoryStore};
pub use rest::RestBackend;

use async_trait::async_trait;
use serde_json::Value;

use crate::auth::{AuthNotifier, AuthUser, Session};
use crate::error::{Error, Result};

/// Backend tables used by the app
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Transactions,
    Categories,
    Budgets,
    RecurringBudgets,
    UserSettings,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Transactions,
        Table::Categories,
        Table::Budgets,
        Table::RecurringBudgets,
        Table::UserSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Transactions => "transactions",
            Table::Categories => "categories",
            Table::Budgets => "budgets",
            Table::RecurringBudgets => "recurring_budgets",
            Table::UserSettings => "user_settings",
        }
    }

    /// Columns forming the table's uniqueness constraint besides `id`
    pub fn unique_key(&self) -> &'static [&'static str] {
        match self {
            Table::Transactions => &[],
            Table::Categories => &["user_id", "name"],
            Table::Budgets => &["user_id", "category_name", "month", "year"],
            Table::RecurringBudgets => &["user_id", "category_name"],
            Table::UserSettings => &["user_id"],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Table::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown table: {}", s))
    }
}

/// Sort direction for `Query::order`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Row filter, ordering, and limit for a table request
///
/// Filter values are kept in their rendered text form, the same form they
/// travel in on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, String)>,
    pub order: Option<(String, Order)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push((column.to_string(), value.to_string()));
        self
    }

    pub fn order(mut self, column: &str, order: Order) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string parameters in PostgREST form
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for (column, value) in &self.filters {
            params.push((column.clone(), format!("eq.{}", value)));
        }
        if let Some((column, order)) = &self.order {
            params.push(("order".to_string(), format!("{}.{}", column, order.as_str())));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Rebuild a query from PostgREST query-string parameters
    ///
    /// `select` and `on_conflict` are ignored; any other parameter must be an
    /// `eq.` filter.
    pub fn from_params<'a, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut query = Query::new();
        for (key, value) in params {
            match key {
                "select" | "on_conflict" => {}
                "order" => {
                    let (column, dir) = value.rsplit_once('.').unwrap_or((value, "asc"));
                    let order = match dir {
                        "asc" => Order::Asc,
                        "desc" => Order::Desc,
                        other => {
                            return Err(Error::InvalidData(format!("Unknown order: {}", other)))
                        }
                    };
                    query = query.order(column, order);
                }
                "limit" => {
                    let limit = value
                        .parse()
                        .map_err(|_| Error::InvalidData(format!("Invalid limit: {}", value)))?;
                    query = query.limit(limit);
                }
                column => {
                    let operand = value.strip_prefix("eq.").ok_or_else(|| {
                        Error::InvalidData(format!("Unsupported filter: {}={}", column, value))
                    })?;
                    query = query.eq(column, operand);
                }
            }
        }
        Ok(query)
    }

    /// Whether a JSON row satisfies every filter
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|(column, expected)| {
            row.get(column)
                .map(|value| render_value(value) == *expected)
                .unwrap_or(false)
        })
    }
}

/// Text form of a JSON scalar as it appears in a filter
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

/// Operations the app needs from its hosted backend
#[async_trait]
pub trait Backend: Send + Sync {
    /// Rows matching the query
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>>;

    /// Insert rows and return them as stored
    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>>;

    /// Patch every row matching the filters and return the updated rows
    async fn update(&self, table: Table, filters: &Query, patch: Value) -> Result<Vec<Value>>;

    /// Insert or merge on the given conflict columns, returning the stored row
    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> Result<Value>;

    async fn delete(&self, table: Table, filters: &Query) -> Result<()>;

    /// Call a server-side function
    async fn rpc(&self, function: &str, args: Value) -> Result<Value>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    async fn current_session(&self) -> Option<Session>;

    /// Replace the local session without notifying subscribers
    async fn set_session(&self, session: Option<Session>);

    /// Exchange the refresh token for a new session
    async fn refresh_session(&self) -> Result<Session>;

    /// Validate the session with the auth API
    async fn get_user(&self) -> Result<AuthUser>;

    /// Id of the signed-in user; fails fast when there is no session
    async fn current_user_id(&self) -> Result<String> {
        self.current_session()
            .await
            .map(|s| s.user.id)
            .ok_or(Error::NotAuthenticated)
    }

    async fn sign_out(&self) -> Result<()>;

    fn auth_events(&self) -> &AuthNotifier;

    fn name(&self) -> &str;
}

/// Backend client, either hosted or in-memory
#[derive(Clone)]
pub enum BackendClient {
    Rest(RestBackend),
    Memory(MemoryBackend),
}

#[async_trait]
impl Backend for BackendClient {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        match self {
            BackendClient::Rest(b) => b.select(table, query).await,
            BackendClient::Memory(b) => b.select(table, query).await,
        }
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        match self {
            BackendClient::Rest(b) => b.insert(table, rows).await,
            BackendClient::Memory(b) => b.insert(table, rows).await,
        }
    }

    async fn update(&self, table: Table, filters: &Query, patch: Value) -> Result<Vec<Value>> {
        match self {
            BackendClient::Rest(b) => b.update(table, filters, patch).await,
            BackendClient::Memory(b) => b.update(table, filters, patch).await,
        }
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> Result<Value> {
        match self {
            BackendClient::Rest(b) => b.upsert(table, row, on_conflict).await,
            BackendClient::Memory(b) => b.upsert(table, row, on_conflict).await,
        }
    }

    async fn delete(&self, table: Table, filters: &Query) -> Result<()> {
        match self {
            BackendClient::Rest(b) => b.delete(table, filters).await,
            BackendClient::Memory(b) => b.delete(table, filters).await,
        }
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value> {
        match self {
            BackendClient::Rest(b) => b.rpc(function, args).await,
            BackendClient::Memory(b) => b.rpc(function, args).await,
        }
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        match self {
            BackendClient::Rest(b) => b.sign_in_with_password(email, password).await,
            BackendClient::Memory(b) => b.sign_in_with_password(email, password).await,
        }
    }

    async fn current_session(&self) -> Option<Session> {
        match self {
            BackendClient::Rest(b) => b.current_session().await,
            BackendClient::Memory(b) => b.current_session().await,
        }
    }

    async fn set_session(&self, session: Option<Session>) {
        match self {
            BackendClient::Rest(b) => b.set_session(session).await,
            BackendClient::Memory(b) => b.set_session(session).await,
        }
    }

    async fn refresh_session(&self) -> Result<Session> {
        match self {
            BackendClient::Rest(b) => b.refresh_session().await,
            BackendClient::Memory(b) => b.refresh_session().await,
        }
    }

    async fn get_user(&self) -> Result<AuthUser> {
        match self {
            BackendClient::Rest(b) => b.get_user().await,
            BackendClient::Memory(b) => b.get_user().await,
        }
    }

    async fn sign_out(&self) -> Result<()> {
        match self {
            BackendClient::Rest(b) => b.sign_out().await,
            BackendClient::Memory(b) => b.sign_out().await,
        }
    }

    fn auth_events(&self) -> &AuthNotifier {
        match self {
            BackendClient::Rest(b) => b.auth_events(),
            BackendClient::Memory(b) => b.auth_events(),
        }
    }

    fn name(&self) -> &str {
        match self {
            BackendClient::Rest(b) => b.name(),
            BackendClient::Memory(b) => b.name(),
        }
    }
}
