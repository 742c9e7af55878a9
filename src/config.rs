//! Environment-driven configuration. `.env` files are honored via dotenvy
//! before this is read.

use std::env;

use crate::types::money::Cents;

/// Starting balance for a new account: $10,000.00.
pub const DEFAULT_STARTING_CASH: Cents = 10_000_00;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub jwt_secret: Vec<u8>,
    pub quote_api_url: Option<String>,
    pub quote_api_token: Option<String>,
    pub starting_cash: Cents,
}

impl Config {
    pub fn from_env() -> Self {
        let starting_cash = env::var("STARTING_CASH_CENTS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_STARTING_CASH);

        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "dev-jwt-secret".to_string())
                .into_bytes(),
            quote_api_url: env::var("QUOTE_API_URL").ok(),
            quote_api_token: env::var("QUOTE_API_TOKEN").ok(),
            starting_cash,
        }
    }
}
