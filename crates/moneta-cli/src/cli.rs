//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Moneta - Track income, expenses, and monthly budgets
#[derive(Parser)]
#[command(name = "moneta")]
#[command(about = "Personal finance tracker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to <config dir>/moneta/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use an in-memory backend with a signed-in demo user
    ///
    /// Nothing is persisted: every invocation starts from the default
    /// categories and settings. Useful for trying commands without a
    /// hosted project.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show who is signed in
    Whoami,

    /// Manage transactions
    Transactions {
        #[command(subcommand)]
        action: Option<TransactionsAction>,
    },

    /// Manage categories
    Categories {
        #[command(subcommand)]
        action: Option<CategoriesAction>,
    },

    /// Monthly budgets
    Budget {
        #[command(subcommand)]
        action: BudgetAction,
    },

    /// Recurring budget templates used to fill new months
    Recurring {
        #[command(subcommand)]
        action: Option<RecurringAction>,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Income, expenses, and recent transactions for a month
    Dashboard {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Emergency fund progress
    Target {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Set the fund's current balance, counting this month's savings
        #[arg(long)]
        savings_balance: Option<f64>,
    },

    /// Totals for a single day
    Day {
        /// Date as YYYY-MM-DD
        date: String,
    },
}

#[derive(Subcommand)]
pub enum TransactionsAction {
    /// List transactions, newest first
    List {
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Record a transaction
    Add {
        #[arg(short, long, allow_hyphen_values = true)]
        amount: f64,

        /// Category name
        #[arg(short, long)]
        category: String,

        /// Date as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,

        #[arg(short, long, default_value = "")]
        notes: String,
    },

    /// Change fields of a transaction
    Update {
        id: String,

        #[arg(short, long, allow_hyphen_values = true)]
        amount: Option<f64>,

        #[arg(short, long)]
        category: Option<String>,

        /// Date as YYYY-MM-DD
        #[arg(short, long)]
        date: Option<String>,

        /// income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete a transaction
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum CategoriesAction {
    /// List categories, income first
    List,

    /// Add a category
    Add {
        #[arg(short, long)]
        name: String,

        /// Hex color (defaults to the palette color for the name)
        #[arg(short, long)]
        color: Option<String>,

        /// income or expense
        #[arg(short = 't', long = "type", default_value = "expense")]
        kind: String,
    },

    /// Rename or recolor a category
    ///
    /// Renaming also updates transactions and budgets that use the old name.
    Update {
        id: String,

        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        color: Option<String>,

        /// income or expense
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Delete a category (system categories cannot be deleted)
    Delete { id: String },

    /// Add the default categories
    Seed {
        /// Add every missing default, not only when there are no categories
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Budget vs spending for a month, with insights
    ///
    /// A month with no budgets is filled from the recurring templates.
    Show {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Set one category's budget
    Set {
        category: String,

        amount: f64,

        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },

    /// Show the previous month's budgets as a draft for this month
    CopyPrevious {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,

        /// Save the draft instead of only showing it
        #[arg(long)]
        save: bool,
    },

    /// Fill a month from the recurring templates
    Generate {
        /// Month as YYYY-MM (defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum RecurringAction {
    /// List active templates
    List,

    /// Set a category's template amount
    Set { category: String, amount: f64 },

    /// Remove a category's template
    Delete { category: String },
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show current settings
    Show,

    /// Change settings
    ///
    /// Pass "none" to a numeric option to clear it.
    Set {
        /// light or dark
        #[arg(long)]
        theme: Option<String>,

        #[arg(long)]
        income_target: Option<String>,

        #[arg(long)]
        emergency_goal: Option<String>,

        /// Manual monthly saving amount
        #[arg(long)]
        total_savings: Option<String>,

        /// Savings accumulated so far
        #[arg(long)]
        current_savings: Option<String>,
    },

    /// Switch between light and dark
    ToggleTheme,
}
