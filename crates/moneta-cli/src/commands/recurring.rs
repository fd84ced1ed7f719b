//! Recurring budget template commands

use anyhow::Result;
use moneta_core::RecurringStore;

use super::{finish, truncate, AppContext};

pub async fn cmd_recurring_list(ctx: &AppContext) -> Result<()> {
    let mut store = RecurringStore::new(ctx.client.clone());
    store.fetch().await;
    finish(store.status_mut())?;

    let templates = store.templates();
    if templates.is_empty() {
        println!("No recurring budgets. Add one with:");
        println!("  moneta recurring set Rent 1200");
        return Ok(());
    }

    println!();
    println!("🔁 Recurring Budgets");
    println!("   ─────────────────────────────────");
    for (category, amount) in templates {
        println!("   {:20} │ {:>10.2}", truncate(category, 20), amount);
    }
    println!();
    println!("   New months with no budgets are filled from these amounts.");

    Ok(())
}

pub async fn cmd_recurring_set(ctx: &AppContext, category: &str, amount: f64) -> Result<()> {
    let mut store = RecurringStore::new(ctx.client.clone());
    store.set(category, amount).await;
    finish(store.status_mut())?;

    println!("✅ Recurring budget for {} set to ${:.2}", category, amount);
    Ok(())
}

pub async fn cmd_recurring_delete(ctx: &AppContext, category: &str) -> Result<()> {
    let mut store = RecurringStore::new(ctx.client.clone());
    store.delete(category).await;
    finish(store.status_mut())?;

    println!("🗑️  Removed recurring budget for {}", category);
    Ok(())
}
