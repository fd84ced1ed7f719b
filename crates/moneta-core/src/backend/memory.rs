//! In-memory backend
//!
//! `MemoryStore` holds the tables, accounts, and issued tokens. It enforces
//! the same rules the hosted project does: rows are only visible to their
//! owner, writes must carry the caller's `user_id`, unique keys reject
//! duplicates, and upserts merge on their conflict columns.
//!
//! `MemoryBackend` is a client over a store with its own session, so several
//! clients (or the mock REST server) can share one store.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;

use crate::auth::{AuthEvent, AuthNotifier, AuthUser, Session};
use crate::error::{Error, Result};

use super::{render_value, Backend, Order, Query, Table};

/// Lifetime of issued access tokens
const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    id: String,
    email: String,
    password: String,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    table: Table,
    column: String,
    value: String,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<Table, Vec<Value>>,
    accounts: Vec<Account>,
    /// access token -> user id
    access_tokens: HashMap<String, String>,
    /// refresh token -> user id
    refresh_tokens: HashMap<String, String>,
    failures: Vec<InjectedFailure>,
    failing_functions: Vec<String>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("{:08x}", self.next_id)
    }

    fn rows(&self, table: Table) -> &[Value] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    fn rows_mut(&mut self, table: Table) -> &mut Vec<Value> {
        self.tables.entry(table).or_default()
    }

    fn issue_session(&mut self, account: &Account) -> Session {
        let access_token = format!("mem-access-{}", self.next_id());
        let refresh_token = format!("mem-refresh-{}", self.next_id());
        self.access_tokens
            .insert(access_token.clone(), account.id.clone());
        self.refresh_tokens
            .insert(refresh_token.clone(), account.id.clone());
        Session {
            access_token,
            refresh_token: Some(refresh_token),
            expires_at: Some(Utc::now().timestamp() + TOKEN_TTL_SECS),
            user: AuthUser {
                id: account.id.clone(),
                email: Some(account.email.clone()),
            },
        }
    }

    fn check_injected(&self, table: Table, row: &Value) -> Result<()> {
        let hit = self.failures.iter().any(|f| {
            f.table == table
                && row
                    .get(&f.column)
                    .map(|v| render_value(v) == f.value)
                    .unwrap_or(false)
        });
        if hit {
            return Err(Error::Backend {
                status: 500,
                message: format!("Injected failure writing to {}", table),
            });
        }
        Ok(())
    }

    /// Whether `candidate` collides with another row on the table's unique key
    fn conflicts(&self, table: Table, candidate: &Value, skip_id: Option<&str>) -> bool {
        let key = table.unique_key();
        if key.is_empty() {
            return false;
        }
        self.rows(table).iter().any(|row| {
            let same_row = skip_id.is_some() && row.get("id").and_then(Value::as_str) == skip_id;
            !same_row && same_columns(row, candidate, key)
        })
    }
}

fn same_columns(a: &Value, b: &Value, columns: &[&str]) -> bool {
    columns.iter().all(|column| match (a.get(column), b.get(column)) {
        (Some(x), Some(y)) => render_value(x) == render_value(y),
        _ => false,
    })
}

fn owned_by(row: &Value, user_id: &str) -> bool {
    row.get("user_id").and_then(Value::as_str) == Some(user_id)
}

fn compare_column(a: &Value, b: &Value, column: &str) -> Ordering {
    match (a.get(column), b.get(column)) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(x), Some(y)) => render_value(x).cmp(&render_value(y)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn as_object(value: Value, table: Table) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidData(format!(
            "Expected a JSON object for {}, got {}",
            table, other
        ))),
    }
}

fn require_user(user: Option<&str>, table: &str) -> Result<String> {
    user.map(str::to_string).ok_or_else(|| Error::Backend {
        status: 401,
        message: format!("new row violates row-level security policy for table \"{}\"", table),
    })
}

fn require_owner(row: &Map<String, Value>, user_id: &str, table: Table) -> Result<()> {
    if row.get("user_id").and_then(Value::as_str) != Some(user_id) {
        return Err(Error::Backend {
            status: 403,
            message: format!(
                "new row violates row-level security policy for table \"{}\"",
                table
            ),
        });
    }
    Ok(())
}

fn duplicate(table: Table) -> Error {
    Error::Backend {
        status: 409,
        message: format!(
            "duplicate key value violates unique constraint \"{}_{}_key\"",
            table,
            table.unique_key().join("_")
        ),
    }
}

/// Shared in-memory tables and accounts
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| Error::InvalidData("Memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| Error::InvalidData("Memory store lock poisoned".into()))
    }

    /// Register an account and return its user id
    pub fn add_user(&self, email: &str, password: &str) -> Result<String> {
        let mut state = self.write()?;
        if let Some(existing) = state.accounts.iter().find(|a| a.email == email) {
            return Ok(existing.id.clone());
        }
        let id = format!("user-{}", state.next_id());
        state.accounts.push(Account {
            id: id.clone(),
            email: email.to_string(),
            password: password.to_string(),
        });
        Ok(id)
    }

    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let mut state = self.write()?;
        let account = state
            .accounts
            .iter()
            .find(|a| a.email == email && a.password == password)
            .cloned()
            .ok_or_else(|| Error::Backend {
                status: 400,
                message: "Invalid login credentials".into(),
            })?;
        Ok(state.issue_session(&account))
    }

    pub fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let mut state = self.write()?;
        let user_id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| Error::Backend {
                status: 400,
                message: "Invalid Refresh Token".into(),
            })?;
        let account = state
            .accounts
            .iter()
            .find(|a| a.id == user_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("User {}", user_id)))?;
        Ok(state.issue_session(&account))
    }

    /// User owning an access token, if the token is live
    pub fn user_for_token(&self, access_token: &str) -> Option<AuthUser> {
        let state = self.read().ok()?;
        let user_id = state.access_tokens.get(access_token)?;
        state
            .accounts
            .iter()
            .find(|a| &a.id == user_id)
            .map(|a| AuthUser {
                id: a.id.clone(),
                email: Some(a.email.clone()),
            })
    }

    pub fn revoke(&self, access_token: &str) {
        if let Ok(mut state) = self.write() {
            state.access_tokens.remove(access_token);
        }
    }

    /// Make every write to `table` whose `column` renders as `value` fail
    pub fn inject_failure(&self, table: Table, column: &str, value: &str) {
        if let Ok(mut state) = self.write() {
            state.failures.push(InjectedFailure {
                table,
                column: column.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Make every call to the rpc `function` fail with a server error
    pub fn inject_rpc_failure(&self, function: &str) {
        if let Ok(mut state) = self.write() {
            state.failing_functions.push(function.to_string());
        }
    }

    /// Total rows in a table across all users
    pub fn row_count(&self, table: Table) -> usize {
        self.read().map(|s| s.rows(table).len()).unwrap_or(0)
    }

    pub fn select(&self, table: Table, query: &Query, user: Option<&str>) -> Result<Vec<Value>> {
        let Some(user_id) = user else {
            return Ok(Vec::new());
        };
        let state = self.read()?;
        let mut rows: Vec<Value> = state
            .rows(table)
            .iter()
            .filter(|row| owned_by(row, user_id) && query.matches(row))
            .cloned()
            .collect();

        if let Some((column, order)) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_column(a, b, column);
                match order {
                    Order::Asc => ord,
                    Order::Desc => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    pub fn insert(&self, table: Table, rows: Vec<Value>, user: Option<&str>) -> Result<Vec<Value>> {
        let user_id = require_user(user, table.as_str())?;
        let mut state = self.write()?;

        let mut prepared = Vec::with_capacity(rows.len());
        for row in rows {
            let mut row = as_object(row, table)?;
            require_owner(&row, &user_id, table)?;
            if !row.contains_key("id") {
                row.insert("id".into(), Value::String(state.next_id()));
            }
            row.entry("created_at")
                .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
            let row = Value::Object(row);
            state.check_injected(table, &row)?;
            let key = table.unique_key();
            let batch_conflict =
                !key.is_empty() && prepared.iter().any(|p| same_columns(p, &row, key));
            if batch_conflict || state.conflicts(table, &row, None) {
                return Err(duplicate(table));
            }
            prepared.push(row);
        }

        state.rows_mut(table).extend(prepared.iter().cloned());
        debug!(table = %table, rows = prepared.len(), "Inserted rows");
        Ok(prepared)
    }

    pub fn update(
        &self,
        table: Table,
        filters: &Query,
        patch: Value,
        user: Option<&str>,
    ) -> Result<Vec<Value>> {
        let Some(user_id) = user else {
            return Ok(Vec::new());
        };
        let mut patch = as_object(patch, table)?;
        patch.remove("id");
        if let Some(owner) = patch.get("user_id") {
            if owner.as_str() != Some(user_id) {
                return Err(Error::Backend {
                    status: 403,
                    message: format!("Cannot reassign rows in {}", table),
                });
            }
        }
        patch.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));

        let mut state = self.write()?;
        let mut updated = Vec::new();
        let indices: Vec<usize> = state
            .rows(table)
            .iter()
            .enumerate()
            .filter(|(_, row)| owned_by(row, user_id) && filters.matches(row))
            .map(|(i, _)| i)
            .collect();

        for i in indices {
            let mut merged = state.rows(table)[i].clone();
            if let Value::Object(map) = &mut merged {
                for (k, v) in &patch {
                    map.insert(k.clone(), v.clone());
                }
            }
            state.check_injected(table, &merged)?;
            let id = merged.get("id").and_then(Value::as_str).map(str::to_string);
            if state.conflicts(table, &merged, id.as_deref()) {
                return Err(duplicate(table));
            }
            state.rows_mut(table)[i] = merged.clone();
            updated.push(merged);
        }
        Ok(updated)
    }

    pub fn upsert(
        &self,
        table: Table,
        row: Value,
        on_conflict: &[&str],
        user: Option<&str>,
    ) -> Result<Value> {
        let user_id = require_user(user, table.as_str())?;
        let incoming = as_object(row, table)?;
        require_owner(&incoming, &user_id, table)?;
        let incoming = Value::Object(incoming);

        let mut state = self.write()?;
        state.check_injected(table, &incoming)?;

        let existing = state
            .rows(table)
            .iter()
            .position(|row| owned_by(row, &user_id) && same_columns(row, &incoming, on_conflict));

        match existing {
            Some(i) => {
                let mut merged = state.rows(table)[i].clone();
                if let (Value::Object(map), Value::Object(fields)) = (&mut merged, &incoming) {
                    for (k, v) in fields {
                        if k != "id" {
                            map.insert(k.clone(), v.clone());
                        }
                    }
                    map.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
                }
                state.rows_mut(table)[i] = merged.clone();
                Ok(merged)
            }
            None => {
                let mut row = incoming;
                if let Value::Object(map) = &mut row {
                    if !map.contains_key("id") {
                        map.insert("id".into(), Value::String(state.next_id()));
                    }
                    map.entry("created_at")
                        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
                }
                if state.conflicts(table, &row, None) {
                    return Err(duplicate(table));
                }
                state.rows_mut(table).push(row.clone());
                Ok(row)
            }
        }
    }

    pub fn delete(&self, table: Table, filters: &Query, user: Option<&str>) -> Result<()> {
        let Some(user_id) = user else {
            return Ok(());
        };
        let mut state = self.write()?;
        let rows = state.rows_mut(table);
        let before = rows.len();
        rows.retain(|row| !(owned_by(row, user_id) && filters.matches(row)));
        debug!(table = %table, removed = before - rows.len(), "Deleted rows");
        Ok(())
    }

    pub fn rpc(&self, function: &str, args: &Value, user: Option<&str>) -> Result<Value> {
        if self.read()?.failing_functions.iter().any(|f| f == function) {
            return Err(Error::Backend {
                status: 500,
                message: format!("Injected failure calling {}", function),
            });
        }
        match function {
            "generate_monthly_budgets" => {
                let user_id = require_user(user, Table::Budgets.as_str())?;
                self.generate_monthly_budgets(args, &user_id)?;
                Ok(Value::Null)
            }
            other => Err(Error::Backend {
                status: 404,
                message: format!("Could not find the function public.{}", other),
            }),
        }
    }

    /// Copy the user's active recurring budgets into a month
    ///
    /// Existing budget rows for that month are left untouched, so running it
    /// twice produces no duplicates.
    fn generate_monthly_budgets(&self, args: &Value, user_id: &str) -> Result<()> {
        let requested = args.get("p_user_id").and_then(Value::as_str);
        if requested != Some(user_id) {
            return Err(Error::Backend {
                status: 403,
                message: "Cannot generate budgets for another user".into(),
            });
        }
        let month = args
            .get("p_month")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::InvalidData("p_month is required".into()))?;
        let year = args
            .get("p_year")
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::InvalidData("p_year is required".into()))?;

        let mut state = self.write()?;
        let templates: Vec<(String, Value)> = state
            .rows(Table::RecurringBudgets)
            .iter()
            .filter(|row| owned_by(row, user_id))
            .filter(|row| row.get("is_active").and_then(Value::as_bool).unwrap_or(true))
            .filter_map(|row| {
                let name = row.get("category_name")?.as_str()?.to_string();
                let amount = row.get("amount")?.clone();
                Some((name, amount))
            })
            .collect();

        let mut created = 0;
        for (category_name, amount) in templates {
            let exists = state.rows(Table::Budgets).iter().any(|row| {
                owned_by(row, user_id)
                    && row.get("category_name").and_then(Value::as_str) == Some(&category_name)
                    && row.get("month").and_then(Value::as_u64) == Some(month)
                    && row.get("year").and_then(Value::as_i64) == Some(year)
            });
            if exists {
                continue;
            }
            let id = state.next_id();
            state.rows_mut(Table::Budgets).push(serde_json::json!({
                "id": id,
                "user_id": user_id,
                "category_name": category_name,
                "amount": amount,
                "month": month,
                "year": year,
                "created_at": Utc::now().to_rfc3339(),
            }));
            created += 1;
        }
        debug!(user_id, month, year, created, "Generated monthly budgets");
        Ok(())
    }
}

/// Client over a `MemoryStore` with its own session
#[derive(Clone)]
pub struct MemoryBackend {
    store: MemoryStore,
    session: Arc<RwLock<Option<Session>>>,
    notifier: AuthNotifier,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            store,
            session: Arc::new(RwLock::new(None)),
            notifier: AuthNotifier::new(),
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// A new client on the same store, with no session
    pub fn detached(&self) -> Self {
        Self::with_store(self.store.clone())
    }

    /// Register an account; returns the user id, or an empty string if the
    /// store is unusable
    pub fn add_user(&self, email: &str, password: &str) -> String {
        self.store.add_user(email, password).unwrap_or_default()
    }

    pub fn revoke_token(&self, access_token: &str) {
        self.store.revoke(access_token);
    }

    fn session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    fn store_session(&self, session: Option<Session>) {
        if let Ok(mut guard) = self.session.write() {
            *guard = session;
        }
    }

    /// User the store sees for this client's requests
    fn caller(&self) -> Result<Option<String>> {
        match self.session() {
            None => Ok(None),
            Some(session) => self
                .store
                .user_for_token(&session.access_token)
                .map(|user| Some(user.id))
                .ok_or_else(|| Error::Backend {
                    status: 401,
                    message: "Invalid JWT".into(),
                }),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        let caller = self.caller()?;
        self.store.select(table, query, caller.as_deref())
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        let caller = self.caller()?;
        self.store.insert(table, rows, caller.as_deref())
    }

    async fn update(&self, table: Table, filters: &Query, patch: Value) -> Result<Vec<Value>> {
        let caller = self.caller()?;
        self.store.update(table, filters, patch, caller.as_deref())
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> Result<Value> {
        let caller = self.caller()?;
        self.store.upsert(table, row, on_conflict, caller.as_deref())
    }

    async fn delete(&self, table: Table, filters: &Query) -> Result<()> {
        let caller = self.caller()?;
        self.store.delete(table, filters, caller.as_deref())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value> {
        let caller = self.caller()?;
        self.store.rpc(function, &args, caller.as_deref())
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.store.sign_in(email, password)?;
        self.store_session(Some(session.clone()));
        self.notifier.notify(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn current_session(&self) -> Option<Session> {
        self.session()
    }

    async fn set_session(&self, session: Option<Session>) {
        self.store_session(session);
    }

    async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .session()
            .and_then(|s| s.refresh_token)
            .ok_or(Error::NotAuthenticated)?;
        let session = self.store.refresh(&refresh_token)?;
        self.store_session(Some(session.clone()));
        self.notifier
            .notify(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    async fn get_user(&self) -> Result<AuthUser> {
        let session = self.session().ok_or(Error::NotAuthenticated)?;
        self.store
            .user_for_token(&session.access_token)
            .ok_or_else(|| Error::Backend {
                status: 401,
                message: "Invalid JWT".into(),
            })
    }

    async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.session() {
            self.store.revoke(&session.access_token);
        }
        self.store_session(None);
        self.notifier.notify(AuthEvent::SignedOut);
        Ok(())
    }

    fn auth_events(&self) -> &AuthNotifier {
        &self.notifier
    }

    fn name(&self) -> &str {
        "memory"
    }
}
