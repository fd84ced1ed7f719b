//! Sessions, auth state notifications, and the auth gate
//!
//! The backend owns the session lifecycle (sign in, refresh, sign out).
//! This module holds the client-side view of it:
//! - `Session` / `AuthUser`: what a sign-in hands back
//! - `AuthNotifier`: pushes session changes to subscribers
//! - `AuthGate`: decides between the app and the login path on startup

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendClient};
use crate::error::Result;
use crate::token_store::{self, TokenStore};

/// Seconds before the recorded expiry at which a session counts as expired
const EXPIRY_SKEW_SECS: i64 = 30;

/// Authenticated user as reported by the auth API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at - EXPIRY_SKEW_SECS <= now,
            None => false,
        }
    }
}

/// A change in auth state
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

/// Broadcasts auth state changes to any number of subscribers
#[derive(Clone)]
pub struct AuthNotifier {
    tx: broadcast::Sender<AuthEvent>,
}

impl AuthNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self { tx }
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Deliver an event; having no subscribers is fine
    pub fn notify(&self, event: AuthEvent) {
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(subscribers = delivered, "Auth event published");
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for AuthNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// A live subscription to auth events; dropping it unsubscribes
pub struct AuthSubscription {
    rx: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Wait for the next event. Returns `None` once the notifier is gone.
    pub async fn recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth subscriber lagged, skipping events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next pending event without waiting
    pub fn try_recv(&mut self) -> Option<AuthEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

/// Where the app should go after the auth check
#[derive(Debug, Clone, PartialEq)]
pub enum Gate {
    App {
        user_id: String,
        email: Option<String>,
    },
    Login,
}

/// Resolves startup auth state and keeps the persisted session in sync
pub struct AuthGate<'a> {
    backend: &'a BackendClient,
    tokens: &'a dyn TokenStore,
}

impl<'a> AuthGate<'a> {
    pub fn new(backend: &'a BackendClient, tokens: &'a dyn TokenStore) -> Self {
        Self { backend, tokens }
    }

    /// Check the session and pick the app or the login path
    ///
    /// A persisted session is restored when the backend has none. An
    /// expired session is refreshed once when a refresh token exists.
    /// Only an auth rejection from the backend revokes the session; other
    /// failures (network) keep the user in the app.
    pub async fn resolve(&self) -> Gate {
        let session = match self.backend.current_session().await {
            Some(session) => Some(session),
            None => {
                let restored = token_store::load_session(self.tokens).await;
                if let Some(ref session) = restored {
                    debug!(user_id = %session.user.id, "Restored persisted session");
                    self.backend.set_session(Some(session.clone())).await;
                }
                restored
            }
        };

        let Some(mut session) = session else {
            return Gate::Login;
        };

        if session.is_expired() {
            if session.refresh_token.is_none() {
                info!("Session expired without refresh token");
                self.forget().await;
                return Gate::Login;
            }
            match self.backend.refresh_session().await {
                Ok(refreshed) => {
                    token_store::save_session(self.tokens, &refreshed).await;
                    session = refreshed;
                }
                Err(e) => {
                    warn!(error = %e, "Session refresh failed");
                    self.forget().await;
                    return Gate::Login;
                }
            }
        }

        match self.backend.get_user().await {
            Ok(user) => Gate::App {
                user_id: user.id,
                email: user.email,
            },
            Err(e) if e.is_auth() => {
                info!(error = %e, "Session rejected by backend");
                self.forget().await;
                Gate::Login
            }
            Err(e) => {
                warn!(error = %e, "Could not validate session, continuing with cached user");
                Gate::App {
                    user_id: session.user.id,
                    email: session.user.email,
                }
            }
        }
    }

    /// Sign in and persist the session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        token_store::save_session(self.tokens, &session).await;
        Ok(session)
    }

    /// Sign out remotely and drop the persisted session
    ///
    /// A fresh client holds no session yet, so the persisted one is loaded
    /// first and its tokens are revoked on the server too.
    pub async fn sign_out(&self) -> Result<()> {
        if self.backend.current_session().await.is_none() {
            if let Some(session) = token_store::load_session(self.tokens).await {
                debug!(user_id = %session.user.id, "Restored persisted session for sign out");
                self.backend.set_session(Some(session)).await;
            }
        }
        let result = self.backend.sign_out().await;
        token_store::clear_session(self.tokens).await;
        result
    }

    async fn forget(&self) {
        self.backend.set_session(None).await;
        token_store::clear_session(self.tokens).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::token_store::MemoryTokenStore;

    fn session(expires_at: Option<i64>) -> Session {
        Session {
            access_token: "token".into(),
            refresh_token: None,
            expires_at,
            user: AuthUser {
                id: "user-1".into(),
                email: None,
            },
        }
    }

    #[test]
    fn test_session_expiry() {
        assert!(!session(None).is_expired_at(1_000));
        assert!(session(Some(1_000)).is_expired_at(1_000));
        assert!(session(Some(1_020)).is_expired_at(1_000));
        assert!(!session(Some(2_000)).is_expired_at(1_000));
    }

    #[tokio::test]
    async fn test_notifier_subscribe_and_unsubscribe() {
        let notifier = AuthNotifier::new();
        let mut sub = notifier.subscribe();
        assert_eq!(notifier.subscriber_count(), 1);

        notifier.notify(AuthEvent::SignedOut);
        assert_eq!(sub.recv().await, Some(AuthEvent::SignedOut));

        sub.unsubscribe();
        assert_eq!(notifier.subscriber_count(), 0);
        // Publishing with no subscribers must not fail
        notifier.notify(AuthEvent::SignedOut);
    }

    #[tokio::test]
    async fn test_gate_without_session_goes_to_login() {
        let backend = BackendClient::Memory(MemoryBackend::new());
        let tokens = MemoryTokenStore::new();
        let gate = AuthGate::new(&backend, &tokens);
        assert_eq!(gate.resolve().await, Gate::Login);
    }

    #[tokio::test]
    async fn test_gate_restores_persisted_session() {
        let memory = MemoryBackend::new();
        memory.add_user("sam@example.com", "hunter22");
        let backend = BackendClient::Memory(memory.clone());
        let tokens = MemoryTokenStore::new();

        let gate = AuthGate::new(&backend, &tokens);
        let signed_in = gate.sign_in("sam@example.com", "hunter22").await.unwrap();

        // A fresh client sharing the same backing store but no session
        let restarted = BackendClient::Memory(memory.detached());
        let gate = AuthGate::new(&restarted, &tokens);
        match gate.resolve().await {
            Gate::App { user_id, email } => {
                assert_eq!(user_id, signed_in.user.id);
                assert_eq!(email.as_deref(), Some("sam@example.com"));
            }
            Gate::Login => panic!("expected restored session"),
        }
    }

    #[tokio::test]
    async fn test_sign_out_from_fresh_client_revokes_persisted_session() {
        let memory = MemoryBackend::new();
        memory.add_user("sam@example.com", "hunter22");
        let backend = BackendClient::Memory(memory.clone());
        let tokens = MemoryTokenStore::new();
        let session = AuthGate::new(&backend, &tokens)
            .sign_in("sam@example.com", "hunter22")
            .await
            .unwrap();

        let restarted = BackendClient::Memory(memory.detached());
        AuthGate::new(&restarted, &tokens).sign_out().await.unwrap();

        assert!(memory.store().user_for_token(&session.access_token).is_none());
        assert!(token_store::load_session(&tokens).await.is_none());
        assert!(restarted.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_sign_out_over_http_revokes_persisted_session() {
        use crate::test_utils::MockRestServer;

        let server = MockRestServer::start().await;
        server.store().add_user("sam@example.com", "hunter22").unwrap();
        let tokens = MemoryTokenStore::new();

        let first = BackendClient::Rest(server.client());
        let session = AuthGate::new(&first, &tokens)
            .sign_in("sam@example.com", "hunter22")
            .await
            .unwrap();
        assert!(server.store().user_for_token(&session.access_token).is_some());

        // A later process: new client, same token file
        let second = BackendClient::Rest(server.client());
        AuthGate::new(&second, &tokens).sign_out().await.unwrap();

        assert!(server.store().user_for_token(&session.access_token).is_none());
        assert!(token_store::load_session(&tokens).await.is_none());
    }

    #[tokio::test]
    async fn test_gate_drops_revoked_session() {
        let memory = MemoryBackend::new();
        memory.add_user("sam@example.com", "hunter22");
        let backend = BackendClient::Memory(memory.clone());
        let tokens = MemoryTokenStore::new();
        let gate = AuthGate::new(&backend, &tokens);
        let session = gate.sign_in("sam@example.com", "hunter22").await.unwrap();

        memory.revoke_token(&session.access_token);

        assert_eq!(gate.resolve().await, Gate::Login);
        assert!(token_store::load_session(&tokens).await.is_none());
        assert!(backend.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_gate_refreshes_expired_session() {
        let memory = MemoryBackend::new();
        memory.add_user("sam@example.com", "hunter22");
        let backend = BackendClient::Memory(memory.clone());
        let tokens = MemoryTokenStore::new();
        let gate = AuthGate::new(&backend, &tokens);
        let mut session = gate.sign_in("sam@example.com", "hunter22").await.unwrap();

        session.expires_at = Some(Utc::now().timestamp() - 10);
        backend.set_session(Some(session.clone())).await;

        assert!(matches!(gate.resolve().await, Gate::App { .. }));
        let persisted = token_store::load_session(&tokens).await.unwrap();
        assert_ne!(persisted.access_token, session.access_token);
        assert!(!persisted.is_expired());
    }
}
