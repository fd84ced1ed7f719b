//! Hosted backend over HTTP
//!
//! Table requests go to `/rest/v1/{table}`, functions to `/rest/v1/rpc/{fn}`,
//! and auth to `/auth/v1/*`. Every request carries the project's anon key
//! in `apikey`; the bearer token is the session's access token when signed
//! in, otherwise the anon key.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::auth::{AuthEvent, AuthNotifier, AuthUser, Session};
use crate::error::{Error, Result};

use super::{Backend, Query, Table};

/// Client for a hosted PostgREST + GoTrue project
#[derive(Clone)]
pub struct RestBackend {
    http_client: Client,
    base_url: String,
    anon_key: String,
    session: Arc<RwLock<Option<Session>>>,
    notifier: AuthNotifier,
}

impl RestBackend {
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            session: Arc::new(RwLock::new(None)),
            notifier: AuthNotifier::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    fn store_session(&self, session: Option<Session>) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(_) => warn!("Session lock poisoned, session not updated"),
        }
    }

    fn bearer(&self) -> String {
        self.session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    fn table_request(&self, method: Method, table: Table) -> RequestBuilder {
        self.request(method, &format!("/rest/v1/{}", table.as_str()))
    }

    async fn token_request(&self, grant_type: &str, body: Value) -> Result<Session> {
        let response = self
            .http_client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        let token: TokenResponse = check(response).await?.json().await?;
        Ok(token.into_session(Utc::now().timestamp()))
    }
}

/// Auth API token grant response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: AuthUser,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        let expires_at = self
            .expires_at
            .or_else(|| self.expires_in.map(|secs| now + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

/// Error body shapes returned by the table and auth APIs
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        let message = self
            .message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)?;
        Some(match self.details {
            Some(details) if !details.is_empty() => format!("{} ({})", message, details),
            _ => message,
        })
    }
}

/// Turn a non-success response into `Error::Backend`
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(ErrorBody::into_message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            } else {
                body
            }
        });
    debug!(status = status.as_u16(), %message, "Backend request failed");

    Err(Error::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Parse a body that may legitimately be empty
async fn json_or_null(response: Response) -> Result<Value> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        Ok(serde_json::from_str(&text)?)
    }
}

fn into_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        row => vec![row],
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Value>> {
        let response = self
            .table_request(Method::GET, table)
            .query(&query.to_params())
            .send()
            .await?;
        let rows: Vec<Value> = check(response).await?.json().await?;
        debug!(table = %table, rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn insert(&self, table: Table, rows: Vec<Value>) -> Result<Vec<Value>> {
        let response = self
            .table_request(Method::POST, table)
            .header("Prefer", "return=representation")
            .json(&rows)
            .send()
            .await?;
        Ok(into_rows(json_or_null(check(response).await?).await?))
    }

    async fn update(&self, table: Table, filters: &Query, patch: Value) -> Result<Vec<Value>> {
        let response = self
            .table_request(Method::PATCH, table)
            .query(&filters.to_params())
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await?;
        Ok(into_rows(json_or_null(check(response).await?).await?))
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> Result<Value> {
        let response = self
            .table_request(Method::POST, table)
            .query(&[("on_conflict", on_conflict.join(","))])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&vec![row])
            .send()
            .await?;
        into_rows(json_or_null(check(response).await?).await?)
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidData(format!("Upsert into {} returned no row", table)))
    }

    async fn delete(&self, table: Table, filters: &Query) -> Result<()> {
        let response = self
            .table_request(Method::DELETE, table)
            .query(&filters.to_params())
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn rpc(&self, function: &str, args: Value) -> Result<Value> {
        let response = self
            .request(Method::POST, &format!("/rest/v1/rpc/{}", function))
            .json(&args)
            .send()
            .await?;
        json_or_null(check(response).await?).await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let session = self
            .token_request("password", json!({ "email": email, "password": password }))
            .await?;
        self.store_session(Some(session.clone()));
        self.notifier.notify(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn current_session(&self) -> Option<Session> {
        self.session()
    }

    async fn set_session(&self, session: Option<Session>) {
        self.store_session(session);
    }

    async fn refresh_session(&self) -> Result<Session> {
        let refresh_token = self
            .session()
            .and_then(|s| s.refresh_token)
            .ok_or(Error::NotAuthenticated)?;
        let session = self
            .token_request("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        self.store_session(Some(session.clone()));
        self.notifier
            .notify(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    async fn get_user(&self) -> Result<AuthUser> {
        if self.session().is_none() {
            return Err(Error::NotAuthenticated);
        }
        let response = self.request(Method::GET, "/auth/v1/user").send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.session().is_some() {
            let result = async {
                let response = self.request(Method::POST, "/auth/v1/logout").send().await?;
                check(response).await.map(|_| ())
            }
            .await;
            if let Err(e) = result {
                warn!(error = %e, "Remote sign out failed, clearing local session anyway");
            }
        }
        self.store_session(None);
        self.notifier.notify(AuthEvent::SignedOut);
        Ok(())
    }

    fn auth_events(&self) -> &AuthNotifier {
        &self.notifier
    }

    fn name(&self) -> &str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_expiry_from_expires_in() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": {"id": "u1", "email": "a@b.c"}
        }))
        .unwrap();
        let session = token.into_session(1_000);
        assert_eq!(session.expires_at, Some(4_600));
        assert_eq!(session.user.id, "u1");
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
    }

    #[test]
    fn test_error_body_messages() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"code":"23505","message":"duplicate key value","details":"Key (name) exists"}"#,
        )
        .unwrap();
        assert_eq!(
            body.into_message().as_deref(),
            Some("duplicate key value (Key (name) exists)")
        );

        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid login credentials"));

        assert!(ErrorBody::default().into_message().is_none());
    }

    #[test]
    fn test_into_rows() {
        assert!(into_rows(Value::Null).is_empty());
        assert_eq!(into_rows(json!({"id": 1})).len(), 1);
        assert_eq!(into_rows(json!([{"id": 1}, {"id": 2}])).len(), 2);
    }

    mod over_http {
        use super::*;
        use crate::backend::Order;
        use crate::test_utils::MockRestServer;

        async fn signed_in(server: &MockRestServer) -> (RestBackend, String) {
            let user_id = server.store().add_user("sam@example.com", "hunter22").unwrap();
            let backend = server.client();
            backend
                .sign_in_with_password("sam@example.com", "hunter22")
                .await
                .unwrap();
            (backend, user_id)
        }

        #[tokio::test]
        async fn test_sign_in_and_get_user() {
            let server = MockRestServer::start().await;
            let (backend, user_id) = signed_in(&server).await;

            assert_eq!(backend.current_user_id().await.unwrap(), user_id);
            let user = backend.get_user().await.unwrap();
            assert_eq!(user.email.as_deref(), Some("sam@example.com"));
            let session = backend.current_session().await.unwrap();
            assert!(!session.is_expired());
        }

        #[tokio::test]
        async fn test_bad_credentials() {
            let server = MockRestServer::start().await;
            server.store().add_user("sam@example.com", "hunter22").unwrap();
            let err = server
                .client()
                .sign_in_with_password("sam@example.com", "wrong")
                .await
                .unwrap_err();
            match err {
                Error::Backend { status, message } => {
                    assert_eq!(status, 400);
                    assert_eq!(message, "Invalid login credentials");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_table_round_trip() {
            let server = MockRestServer::start().await;
            let (backend, user_id) = signed_in(&server).await;

            let rows = vec![
                json!({"user_id": user_id, "amount": 12.5, "category": "Food", "date": "2024-06-02", "type": "expense", "notes": ""}),
                json!({"user_id": user_id, "amount": 3000.0, "category": "Salary", "date": "2024-06-28", "type": "income", "notes": ""}),
            ];
            let inserted = backend.insert(Table::Transactions, rows).await.unwrap();
            assert_eq!(inserted.len(), 2);

            let query = Query::new()
                .eq("user_id", &user_id)
                .order("date", Order::Desc);
            let fetched = backend.select(Table::Transactions, &query).await.unwrap();
            assert_eq!(fetched[0]["category"], "Salary");

            let id = fetched[1]["id"].as_str().unwrap().to_string();
            let updated = backend
                .update(Table::Transactions, &Query::new().eq("id", &id), json!({"amount": 15.0}))
                .await
                .unwrap();
            assert_eq!(updated[0]["amount"], json!(15.0));

            backend
                .delete(Table::Transactions, &Query::new().eq("id", &id))
                .await
                .unwrap();
            assert_eq!(server.store().row_count(Table::Transactions), 1);
        }

        #[tokio::test]
        async fn test_upsert_and_rpc() {
            let server = MockRestServer::start().await;
            let (backend, user_id) = signed_in(&server).await;

            let conflict = ["user_id", "category_name"];
            backend
                .upsert(
                    Table::RecurringBudgets,
                    json!({"user_id": user_id, "category_name": "Rent", "amount": 900.0, "is_active": true}),
                    &conflict,
                )
                .await
                .unwrap();
            let row = backend
                .upsert(
                    Table::RecurringBudgets,
                    json!({"user_id": user_id, "category_name": "Rent", "amount": 950.0, "is_active": true}),
                    &conflict,
                )
                .await
                .unwrap();
            assert_eq!(row["amount"], json!(950.0));
            assert_eq!(server.store().row_count(Table::RecurringBudgets), 1);

            let args = json!({"p_user_id": user_id, "p_month": 3, "p_year": 2025});
            assert_eq!(backend.rpc("generate_monthly_budgets", args).await.unwrap(), Value::Null);
            let budgets = backend
                .select(Table::Budgets, &Query::new().eq("month", 3).eq("year", 2025))
                .await
                .unwrap();
            assert_eq!(budgets.len(), 1);
            assert_eq!(budgets[0]["amount"], json!(950.0));
        }

        #[tokio::test]
        async fn test_anonymous_requests_see_nothing() {
            let server = MockRestServer::start().await;
            let (backend, user_id) = signed_in(&server).await;
            backend
                .insert(
                    Table::Categories,
                    vec![json!({"user_id": user_id, "name": "Food", "color": "#fff", "type": "expense"})],
                )
                .await
                .unwrap();

            let anon = server.client();
            assert!(anon
                .select(Table::Categories, &Query::new())
                .await
                .unwrap()
                .is_empty());
            let err = anon
                .insert(Table::Categories, vec![json!({"user_id": user_id, "name": "X"})])
                .await
                .unwrap_err();
            assert!(err.is_auth());
        }

        #[tokio::test]
        async fn test_refresh_and_sign_out() {
            let server = MockRestServer::start().await;
            let (backend, _) = signed_in(&server).await;
            let mut events = backend.auth_events().subscribe();
            let before = backend.current_session().await.unwrap();

            let refreshed = backend.refresh_session().await.unwrap();
            assert_ne!(refreshed.access_token, before.access_token);
            assert!(matches!(events.recv().await, Some(AuthEvent::TokenRefreshed(_))));

            backend.sign_out().await.unwrap();
            assert_eq!(events.recv().await, Some(AuthEvent::SignedOut));
            assert!(backend.current_session().await.is_none());
            assert!(server.store().user_for_token(&refreshed.access_token).is_none());
        }
    }

    #[test]
    fn test_base_url_trimmed() {
        let backend = RestBackend::new("https://example.supabase.co/", "anon");
        assert_eq!(backend.base_url(), "https://example.supabase.co");
        assert_eq!(backend.name(), "rest");
    }
}
