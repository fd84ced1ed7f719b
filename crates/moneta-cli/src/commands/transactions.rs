//! Transaction command implementations

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use moneta_core::{NewTransaction, TransactionStore, TransactionType, TransactionUpdate};

use super::{finish, format_amount, truncate, AppContext};

/// Parse a date as YYYY-MM-DD
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (use YYYY-MM-DD)", s))
}

pub fn parse_kind(s: &str) -> Result<TransactionType> {
    s.parse::<TransactionType>().map_err(|e| anyhow::anyhow!(e))
}

/// Build a transaction from command-line values; the date defaults to today
pub fn new_transaction(
    amount: f64,
    category: &str,
    date: Option<&str>,
    kind: &str,
    notes: &str,
) -> Result<NewTransaction> {
    let date = match date {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    Ok(NewTransaction {
        amount,
        category: category.to_string(),
        date,
        notes: notes.to_string(),
        kind: parse_kind(kind)?,
    })
}

pub fn transaction_update(
    amount: Option<f64>,
    category: Option<String>,
    date: Option<&str>,
    kind: Option<&str>,
    notes: Option<String>,
) -> Result<TransactionUpdate> {
    Ok(TransactionUpdate {
        amount,
        category,
        date: date.map(parse_date).transpose()?,
        notes,
        kind: kind.map(parse_kind).transpose()?,
    })
}

pub async fn cmd_transactions_list(ctx: &AppContext, limit: usize) -> Result<()> {
    let mut store = TransactionStore::new(ctx.client.clone());
    store.fetch().await;
    finish(store.status_mut())?;

    let transactions = store.transactions();
    if transactions.is_empty() {
        println!("No transactions found. Record one with:");
        println!("  moneta transactions add --amount 12.50 --category Food");
        return Ok(());
    }

    println!();
    println!("📝 Transactions ({} total)", transactions.len());
    println!("   ─────────────────────────────────────────────────────────────");

    for tx in transactions.iter().take(limit) {
        println!(
            "   [{}] {} │ {:>10} │ {:15} │ {}",
            tx.id,
            tx.date,
            format_amount(tx.amount, tx.is_income()),
            truncate(&tx.category, 15),
            truncate(&tx.notes, 30)
        );
    }

    Ok(())
}

pub async fn cmd_transactions_add(ctx: &AppContext, transaction: &NewTransaction) -> Result<()> {
    let mut store = TransactionStore::new(ctx.client.clone());
    let added = store.add(transaction).await;
    finish(store.status_mut())?;

    if let Some(tx) = added {
        println!("✅ Recorded transaction {}:", tx.id);
        println!(
            "   {} │ {} │ {}",
            tx.date,
            format_amount(tx.amount, tx.is_income()),
            tx.category
        );
    }
    Ok(())
}

pub async fn cmd_transactions_update(
    ctx: &AppContext,
    id: &str,
    update: &TransactionUpdate,
) -> Result<()> {
    if update.is_empty() {
        println!("Nothing to update. Pass at least one of --amount, --category, --date, --type, --notes.");
        return Ok(());
    }

    let mut store = TransactionStore::new(ctx.client.clone());
    store.update(id, update).await;
    finish(store.status_mut())?;

    println!("✅ Updated transaction {}", id);
    Ok(())
}

pub async fn cmd_transactions_delete(ctx: &AppContext, id: &str) -> Result<()> {
    let mut store = TransactionStore::new(ctx.client.clone());
    store.delete(id).await;
    finish(store.status_mut())?;

    println!("🗑️  Deleted transaction {}", id);
    Ok(())
}
