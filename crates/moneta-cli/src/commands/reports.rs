//! Report command implementations

use anyhow::{Context, Result};
use chrono::NaiveDate;
use moneta_core::{
    daily_totals, month_transactions, summarize_month, SettingsStore, TransactionStore, YearMonth,
};

use super::{finish, format_amount, truncate, AppContext};

const RECENT_COUNT: usize = 5;

/// Resolve an optional YYYY-MM to a month, defaulting to the current one
pub fn resolve_month(month: Option<&str>) -> Result<YearMonth> {
    match month {
        Some(m) => YearMonth::parse(m).with_context(|| format!("Invalid --month '{}' (use YYYY-MM)", m)),
        None => Ok(YearMonth::current()),
    }
}

async fn load_transactions(ctx: &AppContext) -> Result<TransactionStore> {
    let mut store = TransactionStore::new(ctx.client.clone());
    store.fetch().await;
    finish(store.status_mut())?;
    Ok(store)
}

pub async fn cmd_dashboard(ctx: &AppContext, month: YearMonth) -> Result<()> {
    let store = load_transactions(ctx).await?;
    let summary = summarize_month(store.transactions(), month);

    println!();
    println!("📊 Moneta Dashboard - {}", month.label());
    println!("   ─────────────────────────────");
    println!("   Income:       {}", format_amount(summary.total_income, true));
    println!("   Expenses:     {}", format_amount(summary.total_expenses, false));
    println!("   Net balance:  ${:.2}", summary.net_balance);
    println!("   Transactions: {}", summary.transaction_count);

    let recent = month_transactions(store.transactions(), month);
    if recent.is_empty() {
        println!();
        println!("   No transactions this month.");
        return Ok(());
    }

    println!();
    println!("📝 Recent Transactions");
    println!("   ─────────────────────────────────────────────────────────────");
    for tx in recent.into_iter().take(RECENT_COUNT) {
        println!(
            "   {} │ {:>10} │ {:15} │ {}",
            tx.date,
            format_amount(tx.amount, tx.is_income()),
            truncate(&tx.category, 15),
            truncate(&tx.notes, 30)
        );
    }

    Ok(())
}

/// Emergency fund report; the month's income becomes the income target
pub async fn cmd_target(
    ctx: &AppContext,
    month: YearMonth,
    savings_balance: Option<f64>,
) -> Result<()> {
    let transactions = load_transactions(ctx).await?;
    let mut settings = SettingsStore::new(ctx.client.clone());
    settings.fetch().await;
    finish(settings.status_mut())?;

    let summary = summarize_month(transactions.transactions(), month);
    let synced = settings
        .sync_income_target(&summary)
        .await
        .context("Failed to update income target")?;
    if let Some(balance) = savings_balance {
        settings
            .set_savings_balance(balance, &summary)
            .await
            .context("Failed to update savings balance")?;
    }
    let progress = settings.emergency_fund(&summary);

    println!();
    println!("🎯 Emergency Fund - {}", month.label());
    println!("   ─────────────────────────────");
    println!("   Monthly income:   ${:.2}", progress.monthly_income);
    println!("   Monthly savings:  ${:.2}", progress.monthly_savings);
    println!("   Current balance:  ${:.2}", progress.current_balance);
    if synced {
        println!("   (income target updated to this month's income)");
    }

    if progress.goal <= 0.0 {
        println!();
        println!("   No goal set. Set one with:");
        println!("     moneta settings set --emergency-goal 10000");
        return Ok(());
    }

    println!("   Goal:             ${:.2}", progress.goal);
    println!("   Still needed:     ${:.2}", progress.amount_needed);
    println!("   Progress:         {:.1}%", progress.progress);
    if progress.months_to_goal > 0 {
        println!("   Months to goal:   {}", progress.months_to_goal);
    }
    println!();
    println!("   {}", progress.status_message());

    Ok(())
}

pub async fn cmd_day(ctx: &AppContext, date: NaiveDate) -> Result<()> {
    let store = load_transactions(ctx).await?;
    let totals = daily_totals(store.transactions(), date);

    println!();
    println!("📅 {}", date.format("%A, %B %-d, %Y"));
    println!("   ─────────────────────────────");
    if totals.count == 0 {
        println!("   No transactions on this day.");
        return Ok(());
    }
    println!("   Income:       {}", format_amount(totals.income, true));
    println!("   Expenses:     {}", format_amount(totals.expense, false));
    println!("   Net:          ${:.2}", totals.net);
    println!("   Transactions: {}", totals.count);

    Ok(())
}
