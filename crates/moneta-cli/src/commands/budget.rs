//! Monthly budget command implementations

use anyhow::Result;
use moneta_core::{
    BudgetMap, BudgetStatus, BudgetSummary, BudgetView, InsightKind, RecurringStore,
    TransactionStore, YearMonth,
};

use super::{finish, truncate, AppContext};

fn status_icon(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Healthy => "🟢",
        BudgetStatus::Caution => "🟡",
        BudgetStatus::Warning => "🟠",
        BudgetStatus::Over => "🔴",
    }
}

/// Month totals, shown whether or not any budgets are set
pub fn totals_line(summary: &BudgetSummary) -> String {
    format!(
        "Budget: ${:.2}  Spent: ${:.2}  Remaining: ${:.2}  ({:.1}%)",
        summary.total_budget, summary.total_spent, summary.remaining, summary.progress
    )
}

fn print_budget_map(budgets: &BudgetMap) {
    for (category, amount) in budgets {
        println!("   {:20} │ {:>10.2}", truncate(category, 20), amount);
    }
    println!("   ─────────────────────┼────────────");
    println!("   {:20} │ {:>10.2}", "Total", budgets.values().sum::<f64>());
}

pub async fn cmd_budget_show(ctx: &AppContext, month: YearMonth) -> Result<()> {
    let mut view = BudgetView::new(ctx.client.clone(), month);
    view.load().await;
    finish(view.status_mut())?;

    let mut transactions = TransactionStore::new(ctx.client.clone());
    transactions.fetch().await;
    finish(transactions.status_mut())?;

    let summary = view.summary(transactions.transactions());

    println!();
    println!("📊 Budget for {}", month.label());
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {}", totals_line(&summary));

    if view.budgets().is_empty() {
        println!();
        println!("   No budgets set for this month. Set one with:");
        println!("     moneta budget set <category> <amount> --month {}", month);
        println!("   or copy last month's with:");
        println!("     moneta budget copy-previous --month {} --save", month);
        return Ok(());
    }

    println!();
    println!(
        "   {:20} │ {:>10} │ {:>10} │ {:>10} │ {:>6}",
        "Category", "Budget", "Spent", "Remaining", "%"
    );
    println!("   ─────────────────────┼────────────┼────────────┼────────────┼────────");
    for cat in &summary.categories {
        println!(
            "   {:20} │ {:>10.2} │ {:>10.2} │ {:>10.2} │ {:>5.1}% {} {}",
            truncate(&cat.category, 20),
            cat.budget,
            cat.spent,
            cat.remaining,
            cat.percentage,
            status_icon(cat.status),
            cat.status.label()
        );
    }

    if !summary.unbudgeted.is_empty() {
        println!();
        println!("   Spending without a budget:");
        for (category, spent) in &summary.unbudgeted {
            println!("   {:20} │ {:>10.2}", truncate(category, 20), spent);
        }
    }

    let insights = view.insights(transactions.transactions());
    if !insights.is_empty() {
        println!();
        println!("💡 Insights");
        for insight in insights {
            let icon = match insight.kind {
                InsightKind::Positive => "✅",
                InsightKind::Caution => "⚠️ ",
                InsightKind::Warning => "🚨",
            };
            println!("   {} {}: {}", icon, insight.title, insight.description);
        }
    }

    Ok(())
}

pub async fn cmd_budget_set(
    ctx: &AppContext,
    category: &str,
    amount: f64,
    month: YearMonth,
) -> Result<()> {
    let mut view = BudgetView::new(ctx.client.clone(), month);
    view.set_budget(category, amount).await;
    finish(view.status_mut())?;

    println!(
        "✅ Budget for {} in {} set to ${:.2}",
        category,
        month.label(),
        amount
    );
    Ok(())
}

pub async fn cmd_budget_copy_previous(ctx: &AppContext, month: YearMonth, save: bool) -> Result<()> {
    let mut view = BudgetView::new(ctx.client.clone(), month);
    let draft = view.copy_previous().await;
    finish(view.status_mut())?;

    if draft.is_empty() {
        return Ok(());
    }

    println!();
    println!("📋 Draft for {} (from {})", month.label(), month.prev().label());
    println!("   ─────────────────────────────────");
    print_budget_map(&draft);

    if save {
        view.save(&draft).await;
        finish(view.status_mut())?;
    } else {
        println!();
        println!("   Run again with --save to keep it.");
    }
    Ok(())
}

pub async fn cmd_budget_generate(ctx: &AppContext, month: YearMonth) -> Result<()> {
    let mut recurring = RecurringStore::new(ctx.client.clone());
    recurring.generate(month).await;
    finish(recurring.status_mut())?;

    let budgets = ctx.client.get_budgets(month).await?;
    println!("✅ Budgets for {} generated from recurring templates", month.label());
    if !budgets.is_empty() {
        println!("   ─────────────────────────────────");
        print_budget_map(&budgets);
    }
    Ok(())
}
