//! Budget aggregation for a single month
//!
//! Everything here is pure arithmetic over in-memory slices. The month is
//! always passed in explicitly.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{BudgetMap, Transaction};
use crate::period::YearMonth;

/// How far along a budget is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// Below 60%
    Healthy,
    /// 60% to 80%
    Caution,
    /// 80% to 100%
    Warning,
    /// 100% or more
    Over,
}

impl BudgetStatus {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 100.0 {
            Self::Over
        } else if percentage >= 80.0 {
            Self::Warning
        } else if percentage >= 60.0 {
            Self::Caution
        } else {
            Self::Healthy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Caution => "caution",
            Self::Warning => "warning",
            Self::Over => "over",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Healthy => "on track",
            Self::Caution => "keep an eye on it",
            Self::Warning => "approaching limit",
            Self::Over => "over budget",
        }
    }
}

impl std::fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `spent / budget * 100`, or 0 when there is no positive budget
pub fn percentage(spent: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        (spent / budget) * 100.0
    } else {
        0.0
    }
}

/// Progress of one budgeted category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub category: String,
    pub budget: f64,
    pub spent: f64,
    /// Can be negative when overspent
    pub remaining: f64,
    pub percentage: f64,
    pub status: BudgetStatus,
}

impl CategoryProgress {
    pub fn new(category: &str, budget: f64, spent: f64) -> Self {
        let pct = percentage(spent, budget);
        Self {
            category: category.to_string(),
            budget,
            spent,
            remaining: budget - spent,
            percentage: pct,
            status: BudgetStatus::from_percentage(pct),
        }
    }
}

/// Budget vs actual for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub month: YearMonth,
    /// Sum of all category budgets
    pub total_budget: f64,
    /// Sum of all expense spending in the month, budgeted or not
    pub total_spent: f64,
    /// `total_budget - total_spent`, may be negative
    pub remaining: f64,
    /// `percentage(total_spent, total_budget)`
    pub progress: f64,
    /// One entry per budgeted category, in name order
    pub categories: Vec<CategoryProgress>,
    /// Spend per category across every expense category
    pub spent_by_category: BTreeMap<String, f64>,
    /// Spending in categories that have no budget entry
    pub unbudgeted: BTreeMap<String, f64>,
}

impl BudgetSummary {
    pub fn status(&self) -> BudgetStatus {
        BudgetStatus::from_percentage(self.progress)
    }

    pub fn category(&self, name: &str) -> Option<&CategoryProgress> {
        self.categories.iter().find(|c| c.category == name)
    }
}

/// Income vs expenses for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub month: YearMonth,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_balance: f64,
    pub transaction_count: usize,
}

/// Totals for a single day
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyTotals {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    pub count: usize,
}

/// Transactions dated within the month
pub fn month_transactions(transactions: &[Transaction], month: YearMonth) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|t| month.contains(t.date))
        .collect()
}

/// Expense spend in the month grouped by category name, as absolute values
pub fn expenses_by_category(
    transactions: &[Transaction],
    month: YearMonth,
) -> BTreeMap<String, f64> {
    let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
    for tx in transactions
        .iter()
        .filter(|t| t.is_expense() && month.contains(t.date))
    {
        *by_category.entry(tx.category.clone()).or_insert(0.0) += tx.amount.abs();
    }
    by_category
}

/// Compare a month's spending against its budgets
pub fn summarize_budget(
    transactions: &[Transaction],
    budgets: &BudgetMap,
    month: YearMonth,
) -> BudgetSummary {
    let spent_by_category = expenses_by_category(transactions, month);

    let total_budget: f64 = budgets.values().sum();
    let total_spent: f64 = spent_by_category.values().sum();

    let categories = budgets
        .iter()
        .map(|(name, &budget)| {
            let spent = spent_by_category.get(name).copied().unwrap_or(0.0);
            CategoryProgress::new(name, budget, spent)
        })
        .collect();

    let unbudgeted = spent_by_category
        .iter()
        .filter(|(name, _)| !budgets.contains_key(*name))
        .map(|(name, &spent)| (name.clone(), spent))
        .collect();

    BudgetSummary {
        month,
        total_budget,
        total_spent,
        remaining: total_budget - total_spent,
        progress: percentage(total_spent, total_budget),
        categories,
        spent_by_category,
        unbudgeted,
    }
}

/// Income, expenses and net balance for a month
pub fn summarize_month(transactions: &[Transaction], month: YearMonth) -> MonthlySummary {
    let in_month = month_transactions(transactions, month);

    let total_income: f64 = in_month
        .iter()
        .filter(|t| t.is_income())
        .map(|t| t.amount)
        .sum();
    let total_expenses: f64 = in_month
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| t.amount.abs())
        .sum();

    MonthlySummary {
        month,
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
        transaction_count: in_month.len(),
    }
}

/// Totals for transactions dated exactly `date`
pub fn daily_totals(transactions: &[Transaction], date: NaiveDate) -> DailyTotals {
    transactions
        .iter()
        .filter(|t| t.date == date)
        .fold(DailyTotals::default(), |mut acc, t| {
            if t.is_income() {
                acc.income += t.amount;
                acc.net += t.amount;
            } else {
                acc.expense += t.amount.abs();
                acc.net -= t.amount.abs();
            }
            acc.count += 1;
            acc
        })
}
