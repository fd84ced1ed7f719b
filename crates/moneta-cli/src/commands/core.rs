//! Client setup shared by every command
//!
//! This module contains:
//! - `open_client` - Build the backend from config, or the offline demo
//! - `require_session` - Stop data commands when nobody is signed in

use std::path::Path;

use anyhow::{Context, Result};
use moneta_core::{
    AuthGate, Backend, BackendClient, Config, FileTokenStore, FinanceClient, Gate, MemoryBackend,
    MemoryTokenStore, RestBackend, SettingsStore, TokenStore,
};
use tracing::debug;

pub const DEMO_EMAIL: &str = "demo@moneta.local";
const DEMO_PASSWORD: &str = "demo";

/// Everything a command needs: the typed client and the session store
pub struct AppContext {
    pub client: FinanceClient,
    tokens: Box<dyn TokenStore>,
}

impl AppContext {
    pub fn new(client: FinanceClient, tokens: Box<dyn TokenStore>) -> Self {
        Self { client, tokens }
    }

    pub fn backend(&self) -> &BackendClient {
        self.client.backend()
    }

    pub fn gate(&self) -> AuthGate<'_> {
        AuthGate::new(self.client.backend(), self.tokens.as_ref())
    }
}

/// Open the hosted client from config, or the in-memory demo with `offline`
pub async fn open_client(config_path: Option<&Path>, offline: bool) -> Result<AppContext> {
    if offline {
        return offline_context().await;
    }

    let config = Config::load(config_path).context("Failed to load configuration")?;
    debug!(url = %config.url, session_file = %config.session_file.display(), "Using hosted backend");

    let backend = BackendClient::Rest(RestBackend::new(&config.url, &config.anon_key));
    let tokens = FileTokenStore::new(config.session_file);
    Ok(AppContext::new(FinanceClient::new(backend), Box::new(tokens)))
}

/// In-memory backend with a signed-in demo user, default categories, and settings
pub async fn offline_context() -> Result<AppContext> {
    let memory = MemoryBackend::new();
    memory.add_user(DEMO_EMAIL, DEMO_PASSWORD);

    let ctx = AppContext::new(
        FinanceClient::new(BackendClient::Memory(memory)),
        Box::new(MemoryTokenStore::new()),
    );
    ctx.gate()
        .sign_in(DEMO_EMAIL, DEMO_PASSWORD)
        .await
        .context("Failed to sign in demo user")?;

    ctx.client
        .setup_default_categories()
        .await
        .context("Failed to seed demo categories")?;
    let mut settings = SettingsStore::new(ctx.client.clone());
    settings.fetch().await;
    super::finish(settings.status_mut()).context("Failed to create demo settings")?;

    debug!(backend = ctx.backend().name(), "Offline demo ready");
    Ok(ctx)
}

/// Resolve the auth gate; data commands need a signed-in user
pub async fn require_session(ctx: &AppContext) -> Result<()> {
    match ctx.gate().resolve().await {
        Gate::App { .. } => Ok(()),
        Gate::Login => {
            anyhow::bail!("Not signed in. Run 'moneta login --email <email> --password <password>'")
        }
    }
}
