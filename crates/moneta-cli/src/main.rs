//! Moneta CLI - Personal finance tracker
//!
//! Usage:
//!   moneta login --email EMAIL --password PW   Sign in
//!   moneta transactions add --amount 12.5 --category Food
//!   moneta budget show --month 2024-06         Budget vs spending
//!   moneta dashboard                           Month overview
//!   moneta --offline dashboard                 Try it without a backend

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let ctx = commands::open_client(cli.config.as_deref(), cli.offline).await?;

    match cli.command {
        Commands::Login { email, password } => commands::cmd_login(&ctx, &email, &password).await,
        Commands::Logout => commands::cmd_logout(&ctx).await,
        Commands::Whoami => commands::cmd_whoami(&ctx).await,
        Commands::Transactions { action } => {
            commands::require_session(&ctx).await?;
            match action {
                None => commands::cmd_transactions_list(&ctx, 20).await,
                Some(TransactionsAction::List { limit }) => {
                    commands::cmd_transactions_list(&ctx, limit).await
                }
                Some(TransactionsAction::Add {
                    amount,
                    category,
                    date,
                    kind,
                    notes,
                }) => {
                    let transaction = commands::new_transaction(
                        amount,
                        &category,
                        date.as_deref(),
                        &kind,
                        &notes,
                    )?;
                    commands::cmd_transactions_add(&ctx, &transaction).await
                }
                Some(TransactionsAction::Update {
                    id,
                    amount,
                    category,
                    date,
                    kind,
                    notes,
                }) => {
                    let update = commands::transaction_update(
                        amount,
                        category,
                        date.as_deref(),
                        kind.as_deref(),
                        notes,
                    )?;
                    commands::cmd_transactions_update(&ctx, &id, &update).await
                }
                Some(TransactionsAction::Delete { id }) => {
                    commands::cmd_transactions_delete(&ctx, &id).await
                }
            }
        }
        Commands::Categories { action } => {
            commands::require_session(&ctx).await?;
            match action {
                None | Some(CategoriesAction::List) => commands::cmd_categories_list(&ctx).await,
                Some(CategoriesAction::Add { name, color, kind }) => {
                    commands::cmd_categories_add(&ctx, &name, color.as_deref(), &kind).await
                }
                Some(CategoriesAction::Update {
                    id,
                    name,
                    color,
                    kind,
                }) => {
                    let kind = kind
                        .as_deref()
                        .map(commands::parse_kind)
                        .transpose()?;
                    let update = moneta_core::CategoryUpdate { name, color, kind };
                    commands::cmd_categories_update(&ctx, &id, &update).await
                }
                Some(CategoriesAction::Delete { id }) => {
                    commands::cmd_categories_delete(&ctx, &id).await
                }
                Some(CategoriesAction::Seed { all }) => {
                    commands::cmd_categories_seed(&ctx, all).await
                }
            }
        }
        Commands::Budget { action } => {
            commands::require_session(&ctx).await?;
            match action {
                BudgetAction::Show { month } => {
                    let month = commands::resolve_month(month.as_deref())?;
                    commands::cmd_budget_show(&ctx, month).await
                }
                BudgetAction::Set {
                    category,
                    amount,
                    month,
                } => {
                    let month = commands::resolve_month(month.as_deref())?;
                    commands::cmd_budget_set(&ctx, &category, amount, month).await
                }
                BudgetAction::CopyPrevious { month, save } => {
                    let month = commands::resolve_month(month.as_deref())?;
                    commands::cmd_budget_copy_previous(&ctx, month, save).await
                }
                BudgetAction::Generate { month } => {
                    let month = commands::resolve_month(month.as_deref())?;
                    commands::cmd_budget_generate(&ctx, month).await
                }
            }
        }
        Commands::Recurring { action } => {
            commands::require_session(&ctx).await?;
            match action {
                None | Some(RecurringAction::List) => commands::cmd_recurring_list(&ctx).await,
                Some(RecurringAction::Set { category, amount }) => {
                    commands::cmd_recurring_set(&ctx, &category, amount).await
                }
                Some(RecurringAction::Delete { category }) => {
                    commands::cmd_recurring_delete(&ctx, &category).await
                }
            }
        }
        Commands::Settings { action } => {
            commands::require_session(&ctx).await?;
            match action {
                None | Some(SettingsAction::Show) => commands::cmd_settings_show(&ctx).await,
                Some(SettingsAction::Set {
                    theme,
                    income_target,
                    emergency_goal,
                    total_savings,
                    current_savings,
                }) => {
                    let update = commands::settings_update(
                        theme.as_deref(),
                        income_target.as_deref(),
                        emergency_goal.as_deref(),
                        total_savings.as_deref(),
                        current_savings.as_deref(),
                    )?;
                    commands::cmd_settings_set(&ctx, &update).await
                }
                Some(SettingsAction::ToggleTheme) => commands::cmd_settings_toggle_theme(&ctx).await,
            }
        }
        Commands::Dashboard { month } => {
            commands::require_session(&ctx).await?;
            let month = commands::resolve_month(month.as_deref())?;
            commands::cmd_dashboard(&ctx, month).await
        }
        Commands::Target {
            month,
            savings_balance,
        } => {
            commands::require_session(&ctx).await?;
            let month = commands::resolve_month(month.as_deref())?;
            commands::cmd_target(&ctx, month, savings_balance).await
        }
        Commands::Day { date } => {
            commands::require_session(&ctx).await?;
            let date = commands::parse_date(&date)?;
            commands::cmd_day(&ctx, date).await
        }
    }
}
