//! Budget insights shown alongside a month's budget summary
//!
//! Produces a short, ordered list of findings: overall budget health first,
//! then categories at or near their limit, then a savings note.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::budget::{percentage, BudgetSummary};

/// Maximum number of insights returned for one month
pub const MAX_INSIGHTS: usize = 4;

/// Tone of an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Positive,
    Caution,
    Warning,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Positive => "positive",
            InsightKind::Caution => "caution",
            InsightKind::Warning => "warning",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One insight about the month's budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetInsight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
}

impl BudgetInsight {
    fn new(kind: InsightKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Build insights for a budget summary
pub fn budget_insights(summary: &BudgetSummary) -> Vec<BudgetInsight> {
    let mut insights = Vec::new();
    let progress = summary.progress;

    if progress >= 100.0 {
        insights.push(BudgetInsight::new(
            InsightKind::Warning,
            "Budget Exceeded",
            "You have exceeded your total monthly budget. Consider reviewing your expenses.",
        ));
    } else if progress >= 80.0 {
        insights.push(BudgetInsight::new(
            InsightKind::Caution,
            "Approaching Budget Limit",
            "You've used 80% of your budget. Monitor spending carefully for the rest of the month.",
        ));
    } else if progress < 50.0 {
        insights.push(BudgetInsight::new(
            InsightKind::Positive,
            "Great Budget Management",
            "You're doing excellent with your budget! Keep up the good work.",
        ));
    }

    for cat in &summary.categories {
        let cat_progress = percentage(cat.spent, cat.budget);
        if cat_progress >= 100.0 {
            insights.push(BudgetInsight::new(
                InsightKind::Warning,
                format!("{} Budget Exceeded", cat.category),
                format!(
                    "You've overspent in {} by ${:.2}.",
                    cat.category,
                    cat.spent - cat.budget
                ),
            ));
        } else if cat_progress >= 90.0 {
            insights.push(BudgetInsight::new(
                InsightKind::Caution,
                format!("{} Almost at Limit", cat.category),
                format!(
                    "You have ${:.2} left in your {} budget.",
                    cat.budget - cat.spent,
                    cat.category
                ),
            ));
        }
    }

    let saved = summary.total_budget - summary.total_spent;
    if saved > 0.0 && progress < 80.0 {
        insights.push(BudgetInsight::new(
            InsightKind::Positive,
            "Savings Opportunity",
            format!("You're on track to save ${:.2} this month!", saved),
        ));
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}
