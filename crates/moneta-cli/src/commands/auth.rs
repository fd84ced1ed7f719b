//! Sign in, sign out, and session status

use anyhow::{Context, Result};
use moneta_core::Gate;

use super::AppContext;

pub async fn cmd_login(ctx: &AppContext, email: &str, password: &str) -> Result<()> {
    let session = ctx
        .gate()
        .sign_in(email, password)
        .await
        .context("Sign in failed")?;

    println!(
        "✅ Signed in as {}",
        session.user.email.as_deref().unwrap_or(email)
    );
    Ok(())
}

pub async fn cmd_logout(ctx: &AppContext) -> Result<()> {
    ctx.gate().sign_out().await.context("Sign out failed")?;
    println!("👋 Signed out");
    Ok(())
}

pub async fn cmd_whoami(ctx: &AppContext) -> Result<()> {
    match ctx.gate().resolve().await {
        Gate::App { user_id, email } => {
            println!("👤 {}", email.as_deref().unwrap_or("(no email)"));
            println!("   User id: {}", user_id);
        }
        Gate::Login => {
            println!("Not signed in. Run:");
            println!("  moneta login --email <email> --password <password>");
        }
    }
    Ok(())
}
