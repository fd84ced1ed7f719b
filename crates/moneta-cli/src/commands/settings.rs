//! Settings command implementations

use anyhow::{Context, Result};
use moneta_core::{SettingsStore, Theme, UserSettingsUpdate};

use super::{finish, AppContext};

/// Parse an optional amount where "none" clears the stored value
fn parse_clearable(value: Option<&str>, flag: &str) -> Result<Option<Option<f64>>> {
    match value {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("none") => Ok(Some(None)),
        Some(v) => {
            let amount: f64 = v
                .parse()
                .with_context(|| format!("Invalid amount for --{}: {}", flag, v))?;
            Ok(Some(Some(amount)))
        }
    }
}

pub fn settings_update(
    theme: Option<&str>,
    income_target: Option<&str>,
    emergency_goal: Option<&str>,
    total_savings: Option<&str>,
    current_savings: Option<&str>,
) -> Result<UserSettingsUpdate> {
    Ok(UserSettingsUpdate {
        theme: theme
            .map(|t| t.parse::<Theme>().map_err(|e| anyhow::anyhow!(e)))
            .transpose()?,
        monthly_income_target: parse_clearable(income_target, "income-target")?,
        emergency_fund_goal: parse_clearable(emergency_goal, "emergency-goal")?,
        total_savings: parse_clearable(total_savings, "total-savings")?,
        current_savings: parse_clearable(current_savings, "current-savings")?,
    })
}

fn show_amount(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| "not set".to_string())
}

pub async fn cmd_settings_show(ctx: &AppContext) -> Result<()> {
    let mut store = SettingsStore::new(ctx.client.clone());
    store.fetch().await;
    finish(store.status_mut())?;

    let settings = store.settings();
    println!();
    println!("⚙️  Settings");
    println!("   ─────────────────────────────");
    println!("   Theme:                 {}", settings.theme);
    println!(
        "   Monthly income target: {}",
        show_amount(settings.monthly_income_target)
    );
    println!(
        "   Emergency fund goal:   {}",
        show_amount(settings.emergency_fund_goal)
    );
    println!(
        "   Monthly saving amount: {}",
        settings
            .total_savings
            .map(|v| format!("${:.2}", v))
            .unwrap_or_else(|| "net balance".to_string())
    );
    println!(
        "   Current savings:       {}",
        show_amount(settings.current_savings)
    );
    Ok(())
}

pub async fn cmd_settings_set(ctx: &AppContext, update: &UserSettingsUpdate) -> Result<()> {
    if update.is_empty() {
        println!("Nothing to update. Pass at least one option, e.g. --theme dark");
        return Ok(());
    }

    let mut store = SettingsStore::new(ctx.client.clone());
    store.fetch().await;
    finish(store.status_mut())?;
    store
        .update(update)
        .await
        .context("Failed to update settings")?;

    println!("✅ Settings updated");
    Ok(())
}

pub async fn cmd_settings_toggle_theme(ctx: &AppContext) -> Result<()> {
    let mut store = SettingsStore::new(ctx.client.clone());
    store.fetch().await;
    finish(store.status_mut())?;
    let theme = store
        .toggle_theme()
        .await
        .context("Failed to change theme")?;

    println!("🎨 Theme is now {}", theme);
    Ok(())
}
