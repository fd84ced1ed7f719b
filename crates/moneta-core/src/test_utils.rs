//! Test utilities for moneta-core
//!
//! `MockRestServer` serves the table, function, and auth endpoints of a
//! hosted project on a local port, backed by a `MemoryStore`. Point a
//! `RestBackend` at it to exercise the HTTP client end to end.

use std::net::SocketAddr;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::auth::Session;
use crate::backend::{MemoryStore, Query as RowQuery, RestBackend, Table};
use crate::error::Error;

/// Anon key the mock server accepts
pub const MOCK_ANON_KEY: &str = "mock-anon-key";

type Params = Vec<(String, String)>;
type HandlerResult = std::result::Result<Response, Response>;

#[derive(Clone)]
struct MockState {
    store: MemoryStore,
}

/// Mock hosted backend for tests
pub struct MockRestServer {
    addr: SocketAddr,
    store: MemoryStore,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockRestServer {
    /// Start on an available port with an empty store
    pub async fn start() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    /// Start on an available port serving an existing store
    pub async fn with_store(store: MemoryStore) -> Self {
        let state = MockState {
            store: store.clone(),
        };
        let app = Router::new()
            .route(
                "/rest/v1/:table",
                get(select_rows)
                    .post(insert_rows)
                    .patch(update_rows)
                    .delete(delete_rows),
            )
            .route("/rest/v1/rpc/:function", post(call_function))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/user", get(current_user))
            .route("/auth/v1/logout", post(logout))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            store,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// A REST client pointed at this server
    pub fn client(&self) -> RestBackend {
        RestBackend::new(&self.url(), MOCK_ANON_KEY)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockRestServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn error_response(err: Error) -> Response {
    let (status, message) = match err {
        Error::Backend { status, message } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message,
        ),
        Error::InvalidData(message) => (StatusCode::BAD_REQUEST, message),
        Error::NotFound(message) => (StatusCode::NOT_FOUND, message),
        other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    };
    (status, Json(json!({ "message": message }))).into_response()
}

fn parse_table(table: &str) -> std::result::Result<Table, Response> {
    table.parse::<Table>().map_err(|message| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "code": "42P01", "message": message })),
        )
            .into_response()
    })
}

fn parse_query(params: &Params) -> std::result::Result<RowQuery, Response> {
    RowQuery::from_params(params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .map_err(error_response)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// User behind the request's bearer token; the anon key means no user
fn caller(state: &MockState, headers: &HeaderMap) -> std::result::Result<Option<String>, Response> {
    match bearer(headers) {
        None => Ok(None),
        Some(token) if token == MOCK_ANON_KEY => Ok(None),
        Some(token) => state
            .store
            .user_for_token(token)
            .map(|user| Some(user.id))
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "code": "PGRST301", "message": "Invalid JWT" })),
                )
                    .into_response()
            }),
    }
}

fn wants_representation(headers: &HeaderMap) -> bool {
    headers
        .get_all("prefer")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.contains("return=representation"))
}

fn rows_response(status: StatusCode, rows: Vec<Value>, headers: &HeaderMap) -> Response {
    if wants_representation(headers) {
        (status, Json(Value::Array(rows))).into_response()
    } else {
        status.into_response()
    }
}

async fn select_rows(
    State(state): State<MockState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> HandlerResult {
    let table = parse_table(&table)?;
    let query = parse_query(&params)?;
    let user = caller(&state, &headers)?;
    let rows = state
        .store
        .select(table, &query, user.as_deref())
        .map_err(error_response)?;
    Ok(Json(Value::Array(rows)).into_response())
}

async fn insert_rows(
    State(state): State<MockState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Params>,
    Json(body): Json<Value>,
) -> HandlerResult {
    let table = parse_table(&table)?;
    let user = caller(&state, &headers)?;
    let rows = match body {
        Value::Array(rows) => rows,
        row => vec![row],
    };

    let on_conflict = params
        .iter()
        .find(|(k, _)| k == "on_conflict")
        .map(|(_, v)| v.split(',').map(str::to_string).collect::<Vec<_>>());

    let stored = match on_conflict {
        Some(columns) => {
            let columns: Vec<&str> = columns.iter().map(String::as_str).collect();
            let mut stored = Vec::with_capacity(rows.len());
            for row in rows {
                stored.push(
                    state
                        .store
                        .upsert(table, row, &columns, user.as_deref())
                        .map_err(error_response)?,
                );
            }
            stored
        }
        None => state
            .store
            .insert(table, rows, user.as_deref())
            .map_err(error_response)?,
    };
    Ok(rows_response(StatusCode::CREATED, stored, &headers))
}

async fn update_rows(
    State(state): State<MockState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Params>,
    Json(patch): Json<Value>,
) -> HandlerResult {
    let table = parse_table(&table)?;
    let query = parse_query(&params)?;
    let user = caller(&state, &headers)?;
    let rows = state
        .store
        .update(table, &query, patch, user.as_deref())
        .map_err(error_response)?;
    Ok(rows_response(StatusCode::OK, rows, &headers))
}

async fn delete_rows(
    State(state): State<MockState>,
    Path(table): Path<String>,
    headers: HeaderMap,
    Query(params): Query<Params>,
) -> HandlerResult {
    let table = parse_table(&table)?;
    let query = parse_query(&params)?;
    let user = caller(&state, &headers)?;
    state
        .store
        .delete(table, &query, user.as_deref())
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn call_function(
    State(state): State<MockState>,
    Path(function): Path<String>,
    headers: HeaderMap,
    Json(args): Json<Value>,
) -> HandlerResult {
    let user = caller(&state, &headers)?;
    let result = state
        .store
        .rpc(&function, &args, user.as_deref())
        .map_err(error_response)?;
    if result.is_null() {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(Json(result).into_response())
    }
}

#[derive(Debug, Deserialize)]
struct GrantParams {
    grant_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct GrantBody {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn token_body(session: &Session) -> Value {
    let expires_in = session
        .expires_at
        .map(|at| at - Utc::now().timestamp())
        .unwrap_or(3600);
    json!({
        "access_token": session.access_token,
        "token_type": "bearer",
        "expires_in": expires_in,
        "expires_at": session.expires_at,
        "refresh_token": session.refresh_token,
        "user": session.user,
    })
}

fn grant_error(description: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "invalid_grant", "error_description": description })),
    )
        .into_response()
}

async fn token(
    State(state): State<MockState>,
    Query(params): Query<GrantParams>,
    Json(body): Json<GrantBody>,
) -> HandlerResult {
    let session = match params.grant_type.as_str() {
        "password" => {
            let (Some(email), Some(password)) = (body.email, body.password) else {
                return Err(grant_error("Missing email or password"));
            };
            state.store.sign_in(&email, &password)
        }
        "refresh_token" => {
            let Some(refresh_token) = body.refresh_token else {
                return Err(grant_error("Missing refresh token"));
            };
            state.store.refresh(&refresh_token)
        }
        other => return Err(grant_error(&format!("Unsupported grant type: {}", other))),
    };

    match session {
        Ok(session) => Ok(Json(token_body(&session)).into_response()),
        Err(Error::Backend { message, .. }) => Err(grant_error(&message)),
        Err(other) => Err(error_response(other)),
    }
}

async fn current_user(State(state): State<MockState>, headers: HeaderMap) -> HandlerResult {
    let user = bearer(&headers)
        .filter(|token| *token != MOCK_ANON_KEY)
        .and_then(|token| state.store.user_for_token(token));
    match user {
        Some(user) => Ok(Json(user).into_response()),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "msg": "Invalid token" })),
        )
            .into_response()),
    }
}

async fn logout(State(state): State<MockState>, headers: HeaderMap) -> StatusCode {
    if let Some(token) = bearer(&headers) {
        state.store.revoke(token);
    }
    StatusCode::NO_CONTENT
}
