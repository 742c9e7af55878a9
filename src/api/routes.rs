use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::api::auth::{self, AuthUser, SessionStore, UserCredential, UserStore};
use crate::error::ApiError;
use crate::ledger::SharedLedger;
use crate::persistence::{self, PgPool};
use crate::portfolio::portfolio_view;
use crate::quotes::QuoteSource;
use crate::types::money::{Cents, format_usd};
use crate::types::trade::{Direction, TradeRecord};

#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    pub user_store: UserStore,
    pub sessions: SessionStore,
    pub quotes: Arc<QuoteSource>,
    pub jwt_secret: Vec<u8>,
    pub starting_cash: Cents,
    pub db: Option<PgPool>,
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/reset", post(reset_password))
        .route("/", get(portfolio))
        .route("/history", get(history))
        .route("/buy", post(buy))
        .route("/sell", post(sell))
        .route("/quote", post(quote))
        .route("/price", get(price))
        .with_state(state)
}

async fn health() -> &'static str {
    "healthy"
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: Option<String>,
    password: Option<String>,
    confirmation: Option<String>,
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let username = required(&body.username, "username")?;
    let password = required(&body.password, "password")?;
    let confirmation = required(&body.confirmation, "password confirmation")?;
    if password != confirmation {
        return Err(ApiError::PasswordMismatch);
    }

    let username = username.to_lowercase();
    let password_hash =
        auth::hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?;
    let user_id = Uuid::new_v4();

    {
        // Guard held across the uniqueness check and the insert.
        let mut store = state.user_store.write().await;
        if store.contains_key(&username) {
            return Err(ApiError::UsernameTaken);
        }
        store.insert(
            username.clone(),
            UserCredential {
                user_id,
                username: username.clone(),
                password_hash: password_hash.clone(),
            },
        );
    }
    state
        .ledger
        .write()
        .await
        .open_account(user_id, state.starting_cash);

    if let Some(pool) = &state.db {
        if let Err(err) =
            persistence::insert_user(pool, user_id, &username, &password_hash, state.starting_cash)
                .await
        {
            log::error!("failed to persist user {username}: {err}");
        }
    }

    // The original logs the new user straight in.
    let token = open_session(&state, user_id).await?;
    log::info!("registered user {username}");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user_id": user_id.to_string(),
            "username": username,
            "token": token,
        })),
    ))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let username = required(&body.username, "username")?.to_lowercase();
    let password = required(&body.password, "password")?;

    let credential = state.user_store.read().await.get(&username).cloned();
    let Some(credential) = credential else {
        // Burn a hash check so unknown usernames take as long as bad passwords.
        auth::verify_dummy(password);
        return Err(ApiError::InvalidCredentials);
    };
    if !auth::verify_password(password, &credential.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = open_session(&state, credential.user_id).await?;
    Ok(Json(json!({
        "token": token,
        "user_id": credential.user_id.to_string(),
    })))
}

async fn logout(State(state): State<AppState>, user: AuthUser) -> Json<Value> {
    state.sessions.write().await.remove(&user.session_id);
    Json(json!({ "message": "logged out" }))
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    password: Option<String>,
    password_check: Option<String>,
}

async fn reset_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ResetRequest>,
) -> Result<Json<Value>, ApiError> {
    let password = required(&body.password, "password")?;
    let password_check = required(&body.password_check, "password confirmation")?;
    if password != password_check {
        return Err(ApiError::PasswordMismatch);
    }

    let password_hash =
        auth::hash_password(password).map_err(|e| ApiError::Internal(e.to_string()))?;

    {
        let mut store = state.user_store.write().await;
        let credential = store
            .values_mut()
            .find(|c| c.user_id == user.user_id)
            .ok_or(ApiError::Unauthorized)?;
        credential.password_hash = password_hash.clone();
    }

    if let Some(pool) = &state.db {
        if let Err(err) =
            persistence::update_user_password(pool, user.user_id, &password_hash).await
        {
            log::error!("failed to persist password reset for {}: {err}", user.user_id);
        }
    }

    Ok(Json(json!({ "message": "Password updated" })))
}

async fn portfolio(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let view = portfolio_view(&state.ledger, &state.quotes, user.user_id).await?;

    if let Some(pool) = &state.db {
        for h in &view.holdings {
            if let Err(err) = persistence::update_transaction_cache(
                pool,
                user.user_id,
                &h.symbol,
                &format_usd(h.price),
                &format_usd(h.value),
            )
            .await
            {
                log::error!("failed to persist display cache for {}: {err}", h.symbol);
            }
        }
    }

    let holdings: Vec<Value> = view
        .holdings
        .iter()
        .map(|h| {
            json!({
                "symbol": h.symbol,
                "name": h.name,
                "shares": h.shares,
                "price": h.price,
                "price_usd": format_usd(h.price),
                "value": h.value,
                "value_usd": format_usd(h.value),
            })
        })
        .collect();

    Ok(Json(json!({
        "cash": view.cash,
        "cash_usd": format_usd(view.cash),
        "holdings": holdings,
        "total": view.total,
        "total_usd": format_usd(view.total),
    })))
}

async fn history(State(state): State<AppState>, user: AuthUser) -> Json<Value> {
    let records = state.ledger.read().await.history(user.user_id);
    let rows: Vec<Value> = records
        .iter()
        .map(|r| {
            json!({
                "direction": r.direction.as_str(),
                "symbol": r.symbol,
                "shares": r.shares,
                "price": r.price,
                "price_usd": format_usd(r.price),
                "date": r.executed_at,
            })
        })
        .collect();
    Json(json!({ "transactions": rows }))
}

/// Share counts arrive as a JSON number or a form-style numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShareCount {
    Int(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct TradeRequest {
    symbol: Option<String>,
    shares: Option<ShareCount>,
}

async fn buy(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<TradeRequest>,
) -> Result<Json<Value>, ApiError> {
    execute_trade(&state, user, body, Direction::Buy).await
}

async fn sell(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<TradeRequest>,
) -> Result<Json<Value>, ApiError> {
    execute_trade(&state, user, body, Direction::Sell).await
}

async fn execute_trade(
    state: &AppState,
    user: AuthUser,
    body: TradeRequest,
    direction: Direction,
) -> Result<Json<Value>, ApiError> {
    let symbol = required(&body.symbol, "symbol")?;
    let shares = parse_share_count(body.shares.as_ref())?;

    let quote = state
        .quotes
        .lookup(symbol)
        .await
        .ok_or(ApiError::UnknownSymbol)?;

    let (record, balance) = {
        let mut guard = state.ledger.write().await;
        let record = guard.record_trade(user.user_id, symbol, shares, direction, quote.price)?;
        let balance = guard.cash_balance(user.user_id).unwrap_or(0);
        (record, balance)
    };

    persist_trade(state, &record, balance).await;

    let message = match direction {
        Direction::Buy => "Bought!",
        Direction::Sell => "Sold!",
    };
    log::info!(
        "{} {} {} x{} at {}",
        user.user_id,
        record.direction.as_str(),
        record.symbol,
        shares,
        format_usd(record.price),
    );

    Ok(Json(json!({
        "message": message,
        "symbol": record.symbol,
        "shares": shares,
        "price": record.price,
        "price_usd": format_usd(record.price),
        "cash": balance,
        "cash_usd": format_usd(balance),
    })))
}

#[derive(Debug, Deserialize)]
struct QuoteRequest {
    symbol: Option<String>,
}

async fn quote(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(body): Json<QuoteRequest>,
) -> Result<Json<Value>, ApiError> {
    let symbol = required(&body.symbol, "symbol")?;
    lookup_quote(&state, symbol).await
}

#[derive(Debug, Deserialize)]
struct PriceParams {
    symbol: Option<String>,
}

async fn price(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<PriceParams>,
) -> Result<Json<Value>, ApiError> {
    let symbol = required(&params.symbol, "symbol")?;
    lookup_quote(&state, symbol).await
}

async fn lookup_quote(state: &AppState, symbol: &str) -> Result<Json<Value>, ApiError> {
    let quote = state
        .quotes
        .lookup(symbol)
        .await
        .ok_or(ApiError::UnknownSymbol)?;
    Ok(Json(json!({
        "symbol": quote.symbol,
        "name": quote.name,
        "price": quote.price,
        "price_usd": format_usd(quote.price),
    })))
}

async fn open_session(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    let session_id = Uuid::new_v4();
    let token = auth::create_token(&state.jwt_secret, user_id, session_id)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    state.sessions.write().await.insert(session_id);
    Ok(token)
}

async fn persist_trade(state: &AppState, record: &TradeRecord, balance: Cents) {
    let Some(pool) = &state.db else { return };
    if let Err(err) = persistence::insert_transaction(pool, record).await {
        log::error!("failed to persist trade {}: {err}", record.id);
    }
    if let Err(err) = persistence::update_user_cash(pool, record.user_id, balance).await {
        log::error!("failed to persist cash for {}: {err}", record.user_id);
    }
}

fn required<'a>(field: &'a Option<String>, name: &'static str) -> Result<&'a str, ApiError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::MissingField(name)),
    }
}

fn parse_share_count(field: Option<&ShareCount>) -> Result<i64, ApiError> {
    const BAD_SHARES: &str = "shares must be a positive whole number";
    match field {
        None => Err(ApiError::MissingField("number of shares")),
        Some(ShareCount::Int(n)) if *n > 0 => Ok(*n),
        Some(ShareCount::Text(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or(ApiError::InvalidFormat(BAD_SHARES)),
        Some(_) => Err(ApiError::InvalidFormat(BAD_SHARES)),
    }
}
