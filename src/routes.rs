// Account REST API - route table and request handlers

use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{MethodFilter, MethodRouter},
    Router,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

use crate::content_type::{self, check_content_type};
use crate::db::Database;
use crate::entities::Account;
use crate::error::{error_response, AccountError, Result};
use crate::security;

pub const SERVICE_NAME: &str = "Account REST API Service";
pub const API_VERSION: &str = "1.0";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

// ============================================================================
// Route table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Health,
    Index,
    CreateAccount,
    ListAccounts,
    ReadAccount,
    UpdateAccount,
    DeleteAccount,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    pub endpoint: Endpoint,
}

const fn route(method: Method, path: &'static str, endpoint: Endpoint) -> Route {
    Route {
        method,
        path,
        endpoint,
    }
}

/// Every (method, path) the service answers. Anything else on a listed path
/// is a 405, anything on an unlisted path is a 404.
pub const ROUTES: [Route; 7] = [
    route(Method::GET, "/health", Endpoint::Health),
    route(Method::GET, "/", Endpoint::Index),
    route(Method::POST, "/accounts", Endpoint::CreateAccount),
    route(Method::GET, "/accounts", Endpoint::ListAccounts),
    route(Method::GET, "/accounts/:id", Endpoint::ReadAccount),
    route(Method::PUT, "/accounts/:id", Endpoint::UpdateAccount),
    route(Method::DELETE, "/accounts/:id", Endpoint::DeleteAccount),
];

impl Endpoint {
    fn attach(self, router: MethodRouter<AppState>, filter: MethodFilter) -> MethodRouter<AppState> {
        match self {
            Endpoint::Health => router.on(filter, health),
            Endpoint::Index => router.on(filter, index),
            Endpoint::CreateAccount => router.on(filter, create_account),
            Endpoint::ListAccounts => router.on(filter, list_accounts),
            Endpoint::ReadAccount => router.on(filter, read_account),
            Endpoint::UpdateAccount => router.on(filter, update_account),
            Endpoint::DeleteAccount => router.on(filter, delete_account),
        }
    }
}

fn method_filter(method: &Method) -> anyhow::Result<MethodFilter> {
    MethodFilter::try_from(method.clone())
        .map_err(|e| anyhow::anyhow!("no method filter for {}: {}", method, e))
}

/// Build the full application: route table, JSON 404 fallback and the
/// security middleware.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    Ok(security::apply(routes_from(&ROUTES)?).with_state(state))
}

/// Fold a route table into one method router per path. Fails on a method
/// axum cannot dispatch.
fn routes_from(routes: &[Route]) -> anyhow::Result<Router<AppState>> {
    let mut by_path: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();
    for route in routes {
        let filter = method_filter(&route.method)?;
        let method_router = by_path
            .remove(route.path)
            .unwrap_or_else(MethodRouter::new);
        by_path.insert(route.path, route.endpoint.attach(method_router, filter));
    }

    Ok(by_path
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(path, method_router)
        })
        .fallback(not_found))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "OK" }))
}

/// GET /
async fn index() -> impl IntoResponse {
    Json(json!({
        "name": SERVICE_NAME,
        "version": API_VERSION,
    }))
}

/// POST /accounts
async fn create_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response> {
    info!("Request to create an Account");
    check_content_type(content_type::JSON, declared_content_type(&headers))?;
    let data = parse_json(&body)?;

    let mut account = Account::default();
    account.deserialize(&data)?;
    state.db.with_transaction(|tx| account.create(tx))?;

    let location = match account.id {
        Some(id) => format!("/accounts/{}", id),
        None => return Err(AccountError::MissingId),
    };
    info!(location = %location, "Account created");

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(account.serialize()),
    )
        .into_response())
}

/// GET /accounts
async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
    info!("Request to list all accounts");
    let accounts = state.db.with_transaction(|tx| Account::all(tx))?;
    info!("Returning [{}] accounts", accounts.len());

    Ok(Json(accounts.iter().map(Account::serialize).collect()))
}

/// GET /accounts/:id
async fn read_account(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Value>> {
    let id = path_id(raw_id)?;
    info!("Request to read an Account with id: {}", id);

    let account = state
        .db
        .with_transaction(|tx| Account::find(tx, id))?
        .ok_or(AccountError::NotFound(id))?;

    Ok(Json(account.serialize()))
}

/// PUT /accounts/:id
async fn update_account(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let id = path_id(raw_id)?;
    info!("Request to update an Account with id: {}", id);
    check_content_type(content_type::JSON, declared_content_type(&headers))?;
    let data = parse_json(&body)?;

    let account = state.db.with_transaction(|tx| {
        let mut account = Account::find(tx, id)?.ok_or(AccountError::NotFound(id))?;
        account.deserialize(&data)?;
        account.update(tx)?;
        Ok(account)
    })?;

    Ok(Json(account.serialize()))
}

/// DELETE /accounts/:id - absent ids still answer 204
async fn delete_account(
    State(state): State<AppState>,
    raw_id: Result<Path<String>, PathRejection>,
) -> Result<StatusCode> {
    let id = path_id(raw_id)?;
    info!("Request to delete an Account with id: {}", id);

    state.db.with_transaction(|tx| match Account::find(tx, id)? {
        Some(account) => account.delete(tx),
        None => Ok(()),
    })?;

    Ok(StatusCode::NO_CONTENT)
}

async fn not_found(uri: Uri) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("The requested URL {} was not found on the server.", uri.path()),
    )
}

// ============================================================================
// Helpers
// ============================================================================

fn declared_content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

fn parse_json(body: &Bytes) -> Result<Value> {
    serde_json::from_slice(body).map_err(|e| AccountError::MalformedBody(e.to_string()))
}

fn path_id(raw: Result<Path<String>, PathRejection>) -> Result<i64> {
    match raw {
        Ok(Path(raw)) => parse_id(&raw),
        // e.g. a segment that does not percent-decode to UTF-8
        Err(rejection) => Err(AccountError::InvalidId(rejection.body_text())),
    }
}

/// Ids are non-negative integers; anything else cannot name an account.
fn parse_id(raw: &str) -> Result<i64> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 0 && !raw.starts_with('+') => Ok(id),
        _ => Err(AccountError::InvalidId(raw.to_string())),
    }
}
