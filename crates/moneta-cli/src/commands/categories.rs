//! Category command implementations

use anyhow::Result;
use moneta_core::defaults::color_for;
use moneta_core::{CategoryStore, CategoryUpdate, NewCategory, TransactionType};

use super::{finish, parse_kind, AppContext};

pub async fn cmd_categories_list(ctx: &AppContext) -> Result<()> {
    let mut store = CategoryStore::new(ctx.client.clone());
    store.fetch().await;
    finish(store.status_mut())?;

    if store.categories().is_empty() {
        println!("No categories yet. Add the defaults with:");
        println!("  moneta categories seed");
        return Ok(());
    }

    for (kind, header) in [
        (TransactionType::Income, "💰 Income Categories"),
        (TransactionType::Expense, "🧾 Expense Categories"),
    ] {
        println!();
        println!("{}", header);
        println!("   ─────────────────────────────────────────────");
        for category in store.by_kind(kind) {
            let system = if category.is_system { " (system)" } else { "" };
            println!(
                "   [{}] {:20} {}{}",
                category.id, category.name, category.color, system
            );
        }
    }

    Ok(())
}

pub async fn cmd_categories_add(
    ctx: &AppContext,
    name: &str,
    color: Option<&str>,
    kind: &str,
) -> Result<()> {
    let category = NewCategory {
        name: name.to_string(),
        color: color.unwrap_or_else(|| color_for(name)).to_string(),
        kind: parse_kind(kind)?,
    };

    let mut store = CategoryStore::new(ctx.client.clone());
    let added = store.add(&category).await;
    finish(store.status_mut())?;

    if let Some(c) = added {
        println!("✅ Added {} category '{}' [{}]", c.kind, c.name, c.id);
    }
    Ok(())
}

pub async fn cmd_categories_update(
    ctx: &AppContext,
    id: &str,
    update: &CategoryUpdate,
) -> Result<()> {
    let mut store = CategoryStore::new(ctx.client.clone());
    store.update(id, update).await;
    finish(store.status_mut())?;

    println!("✅ Updated category {}", id);
    if let Some(ref name) = update.name {
        println!("   Transactions and budgets now use '{}'", name);
    }
    Ok(())
}

pub async fn cmd_categories_delete(ctx: &AppContext, id: &str) -> Result<()> {
    let mut store = CategoryStore::new(ctx.client.clone());
    store.delete(id).await;
    finish(store.status_mut())?;

    println!("🗑️  Deleted category {}", id);
    Ok(())
}

pub async fn cmd_categories_seed(ctx: &AppContext, all_missing: bool) -> Result<()> {
    let mut store = CategoryStore::new(ctx.client.clone());
    store.fetch().await;
    store.seed_defaults(all_missing).await;
    finish(store.status_mut())
}
