//! Moneta Core Library
//!
//! Client-side logic for the Moneta personal finance tracker:
//! - Domain models for transactions, categories, budgets, and settings
//! - Backend abstraction over a hosted REST + auth API (and an in-memory twin)
//! - Typed per-entity operations and client-side stores
//! - Budget aggregation, insights, and emergency fund progress
//! - Month navigation and recurring budget materialization
//! - Auth gate, session notifications, and local session storage

pub mod api;
pub mod auth;
pub mod backend;
pub mod budget;
pub mod config;
pub mod defaults;
pub mod error;
pub mod insights;
pub mod models;
pub mod period;
pub mod store;
pub mod target;
pub mod token_store;

/// Test utilities including a mock REST backend server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use api::FinanceClient;
pub use auth::{AuthEvent, AuthGate, AuthNotifier, AuthSubscription, AuthUser, Gate, Session};
pub use backend::{Backend, BackendClient, MemoryBackend, MemoryStore, Order, Query, RestBackend, Table};
pub use budget::{
    daily_totals, expenses_by_category, month_transactions, percentage, summarize_budget,
    summarize_month, BudgetStatus, BudgetSummary, CategoryProgress, DailyTotals, MonthlySummary,
};
pub use config::Config;
pub use error::{Error, Result};
pub use insights::{budget_insights, BudgetInsight, InsightKind};
pub use models::*;
pub use period::{Direction, MonthCursor, YearMonth};
pub use store::{
    BudgetStore, BudgetView, CategoryStore, Notice, NoticeKind, RecurringStore, SettingsStore,
    StoreStatus, TransactionStore,
};
pub use target::EmergencyFundProgress;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
