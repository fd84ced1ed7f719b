//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `auth` - Sign in, sign out, and session status
//! - `budget` - Monthly budget commands (show, set, copy-previous, generate)
//! - `categories` - Category management commands
//! - `core` - Client setup shared by every command (open_client)
//! - `recurring` - Recurring budget template commands
//! - `reports` - Dashboard, emergency fund target, and daily totals
//! - `settings` - Settings commands
//! - `transactions` - Transaction commands (list, add, update, delete)

pub mod auth;
pub mod budget;
pub mod categories;
pub mod core;
pub mod recurring;
pub mod reports;
pub mod settings;
pub mod transactions;

// Re-export command functions for main.rs
pub use auth::*;
pub use budget::*;
pub use categories::*;
pub use core::*;
pub use recurring::*;
pub use reports::*;
pub use settings::*;
pub use transactions::*;

use anyhow::Result;
use moneta_core::{NoticeKind, StoreStatus};

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Colored amount: red for expenses, green for income
pub fn format_amount(amount: f64, is_income: bool) -> String {
    if is_income {
        format!("\x1b[32m+${:.2}\x1b[0m", amount.abs())
    } else {
        format!("\x1b[31m${:.2}\x1b[0m", amount.abs())
    }
}

/// Print a store's pending notices and turn a recorded failure into an error
pub fn finish(status: &mut StoreStatus) -> Result<()> {
    let error = status.error().map(str::to_string);
    for notice in status.take_notices() {
        match notice.kind {
            NoticeKind::Success => println!("✅ {}", notice.message),
            NoticeKind::Info => println!("💡 {}", notice.message),
            NoticeKind::Error => {}
        }
    }
    match error {
        Some(message) => anyhow::bail!(message),
        None => Ok(()),
    }
}
