use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use papertrader::api::auth::{SessionStore, UserStore};
use papertrader::api::routes::{AppState, app_router};
use papertrader::config::Config;
use papertrader::ledger::{Ledger, SharedLedger};
use papertrader::persistence;
use papertrader::quotes::{FixedQuotes, HttpQuotes, QuoteSource};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = Config::from_env();

    let ledger: SharedLedger = Arc::new(RwLock::new(Ledger::new()));
    let user_store: UserStore = Arc::new(RwLock::new(HashMap::new()));
    let sessions: SessionStore = Arc::new(RwLock::new(HashSet::new()));

    let quotes = Arc::new(match &config.quote_api_url {
        Some(url) => QuoteSource::Http(HttpQuotes::new(
            url.clone(),
            config.quote_api_token.clone(),
        )),
        None => {
            log::warn!("QUOTE_API_URL not set, serving built-in demo quotes");
            QuoteSource::Fixed(FixedQuotes::demo())
        }
    });

    let db = match &config.database_url {
        Some(url) => Some(
            persistence::create_pool_and_migrate(url)
                .await
                .expect("database connection"),
        ),
        None => {
            log::warn!("DATABASE_URL not set, state will not survive restarts");
            None
        }
    };
    if let Some(pool) = &db {
        persistence::hydrate(pool, &user_store, &ledger)
            .await
            .expect("hydration");
    }

    let state = AppState {
        ledger,
        user_store,
        sessions,
        quotes,
        jwt_secret: config.jwt_secret.clone(),
        starting_cash: config.starting_cash,
        db,
    };

    let app = app_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("bind");
    log::info!("listening on {}", config.bind_addr);
    axum::serve(listener, app).await.expect("server");
}
