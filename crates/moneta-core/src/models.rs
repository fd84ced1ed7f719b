//! Domain models for Moneta
//!
//! Field names follow the backend's column names so rows deserialize
//! directly from REST responses.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Budget amounts keyed by category name
pub type BudgetMap = BTreeMap<String, f64>;

/// Treat JSON `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whether money came in or went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded income or expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Signed amount. Expenses may be stored negative or positive
    /// depending on the client that wrote them; aggregation uses `abs`.
    pub amount: f64,
    /// Category name (not an id)
    pub category: String,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Merge a partial update into this transaction
    pub fn apply(&mut self, update: &TransactionUpdate) {
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(ref category) = update.category {
            self.category = category.clone();
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(ref notes) = update.notes {
            self.notes = notes.clone();
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
    }
}

/// A transaction as submitted by the user, before the backend assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: f64,
    pub category: String,
    pub date: NaiveDate,
    pub notes: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// Partial transaction update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
}

impl TransactionUpdate {
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.notes.is_none()
            && self.kind.is_none()
    }
}

/// A named, colored income/expense bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub user_id: String,
    /// Seeded defaults cannot be deleted
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_system: bool,
}

impl Category {
    pub fn apply(&mut self, update: &CategoryUpdate) {
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref color) = update.color {
            self.color = color.clone();
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionType>,
}

/// A per-category, per-month spending ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub category_name: String,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
}

/// A default per-category amount used to populate new months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringBudget {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    pub category_name: String,
    pub amount: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Display theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

/// Anything other than "dark" is treated as light
impl From<String> for Theme {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("dark") {
            Self::Dark
        } else {
            Self::Light
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-user settings singleton
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub theme: Theme,
    #[serde(default)]
    pub monthly_income_target: Option<f64>,
    #[serde(default)]
    pub emergency_fund_goal: Option<f64>,
    /// Manual monthly saving amount; `None` means derive from net balance
    #[serde(default)]
    pub total_savings: Option<f64>,
    #[serde(default)]
    pub current_savings: Option<f64>,
}

impl UserSettings {
    pub fn apply(&mut self, update: &UserSettingsUpdate) {
        if let Some(theme) = update.theme {
            self.theme = theme;
        }
        if let Some(v) = update.monthly_income_target {
            self.monthly_income_target = v;
        }
        if let Some(v) = update.emergency_fund_goal {
            self.emergency_fund_goal = v;
        }
        if let Some(v) = update.total_savings {
            self.total_savings = v;
        }
        if let Some(v) = update.current_savings {
            self.current_savings = v;
        }
    }
}

/// Partial settings update
///
/// Outer `None` leaves the column untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserSettingsUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income_target: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_fund_goal: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_savings: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_savings: Option<Option<f64>>,
}

impl UserSettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.theme.is_none()
            && self.monthly_income_target.is_none()
            && self.emergency_fund_goal.is_none()
            && self.total_savings.is_none()
            && self.current_savings.is_none()
    }
}
