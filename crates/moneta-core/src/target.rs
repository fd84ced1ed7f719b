//! Emergency fund progress
//!
//! Combines the month's income/expense summary with the user's savings
//! settings to show how far the emergency fund is from its goal.

use serde::{Deserialize, Serialize};

use crate::budget::MonthlySummary;
use crate::models::UserSettings;

/// Progress toward the emergency fund goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyFundProgress {
    /// Stored income target, or the month's actual income
    pub monthly_income: f64,
    /// Manual saving amount, or the month's net balance
    pub monthly_savings: f64,
    /// Monthly savings plus accumulated savings
    pub current_balance: f64,
    pub goal: f64,
    pub amount_needed: f64,
    /// 0-100
    pub progress: f64,
    /// Months at the current balance rate; 0 when the balance is not positive
    pub months_to_goal: u32,
}

impl EmergencyFundProgress {
    pub fn compute(month: &MonthlySummary, settings: &UserSettings) -> Self {
        let monthly_savings = settings.total_savings.unwrap_or(month.net_balance);
        let current_balance = monthly_savings + settings.current_savings.unwrap_or(0.0);
        let monthly_income = settings
            .monthly_income_target
            .unwrap_or(month.total_income);
        let goal = settings.emergency_fund_goal.unwrap_or(0.0);

        let amount_needed = (goal - current_balance).max(0.0);
        let progress = if goal > 0.0 {
            (current_balance / goal * 100.0).min(100.0)
        } else {
            0.0
        };
        let months_to_goal = if current_balance > 0.0 {
            (goal / current_balance).ceil().max(0.0) as u32
        } else {
            0
        };

        Self {
            monthly_income,
            monthly_savings,
            current_balance,
            goal,
            amount_needed,
            progress,
            months_to_goal,
        }
    }

    pub fn status_message(&self) -> &'static str {
        if self.progress >= 100.0 {
            "Goal reached! Your emergency fund is fully funded."
        } else if self.progress >= 75.0 {
            "Almost there. Keep going!"
        } else if self.progress >= 50.0 {
            "Halfway to your goal."
        } else if self.progress >= 25.0 {
            "Good start. Keep building your fund."
        } else {
            "Just getting started."
        }
    }
}

/// Stored `current_savings` that makes the displayed balance equal `desired`
pub fn current_savings_for_balance(desired: f64, monthly_savings: f64) -> f64 {
    (desired - monthly_savings).max(0.0)
}

/// New income target to store, if the month's income should replace it
pub fn auto_income_target(month: &MonthlySummary, settings: &UserSettings) -> Option<f64> {
    let income = month.total_income;
    if income > 0.0 && settings.monthly_income_target != Some(income) {
        Some(income)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::YearMonth;

    fn month(income: f64, expenses: f64) -> MonthlySummary {
        MonthlySummary {
            month: YearMonth::new(2024, 6).unwrap(),
            total_income: income,
            total_expenses: expenses,
            net_balance: income - expenses,
            transaction_count: 2,
        }
    }

    #[test]
    fn test_derived_from_net_balance() {
        let settings = UserSettings {
            emergency_fund_goal: Some(10000.0),
            current_savings: Some(500.0),
            ..Default::default()
        };
        let p = EmergencyFundProgress::compute(&month(3000.0, 1000.0), &settings);
        assert_eq!(p.monthly_savings, 2000.0);
        assert_eq!(p.current_balance, 2500.0);
        assert_eq!(p.amount_needed, 7500.0);
        assert_eq!(p.progress, 25.0);
        assert_eq!(p.months_to_goal, 4);
        assert_eq!(p.monthly_income, 3000.0);
    }

    #[test]
    fn test_manual_saving_amount_wins() {
        let settings = UserSettings {
            emergency_fund_goal: Some(1000.0),
            total_savings: Some(1500.0),
            monthly_income_target: Some(4000.0),
            ..Default::default()
        };
        let p = EmergencyFundProgress::compute(&month(3000.0, 1000.0), &settings);
        assert_eq!(p.current_balance, 1500.0);
        assert_eq!(p.progress, 100.0);
        assert_eq!(p.amount_needed, 0.0);
        assert_eq!(p.monthly_income, 4000.0);
        assert_eq!(p.months_to_goal, 1);
    }

    #[test]
    fn test_no_goal_and_negative_balance() {
        let p = EmergencyFundProgress::compute(&month(100.0, 500.0), &UserSettings::default());
        assert_eq!(p.goal, 0.0);
        assert_eq!(p.progress, 0.0);
        assert_eq!(p.months_to_goal, 0);
        assert_eq!(p.current_balance, -400.0);
    }

    #[test]
    fn test_current_savings_for_balance() {
        assert_eq!(current_savings_for_balance(5000.0, 2000.0), 3000.0);
        assert_eq!(current_savings_for_balance(1000.0, 2000.0), 0.0);
    }

    #[test]
    fn test_auto_income_target() {
        let settings = UserSettings {
            monthly_income_target: Some(3000.0),
            ..Default::default()
        };
        assert_eq!(auto_income_target(&month(3000.0, 0.0), &settings), None);
        assert_eq!(auto_income_target(&month(3500.0, 0.0), &settings), Some(3500.0));
        assert_eq!(auto_income_target(&month(0.0, 10.0), &settings), None);
    }
}
