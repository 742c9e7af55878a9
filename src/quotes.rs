//! Quote lookup. Two sources behind one enum: a real HTTP provider and a
//! fixed in-memory table for development and tests. Unknown symbols and
//! provider failures look the same to callers (`None`); a failed lookup
//! must only ever reject the request that asked for it.

use std::collections::HashMap;

use serde::Deserialize;

use crate::types::money::Cents;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Cents,
}

#[derive(Debug)]
pub enum QuoteSource {
    Http(HttpQuotes),
    Fixed(FixedQuotes),
}

impl QuoteSource {
    /// Resolve a symbol to its current quote, or `None` when the symbol is
    /// unknown or the provider is unreachable.
    pub async fn lookup(&self, symbol: &str) -> Option<Quote> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return None;
        }
        match self {
            QuoteSource::Http(http) => http.lookup(&symbol).await,
            QuoteSource::Fixed(fixed) => fixed.lookup(&symbol),
        }
    }
}

/// HTTP provider: `GET {base}/stock/{SYMBOL}/quote?token=...` returning
/// `{"companyName": ..., "latestPrice": <dollars>}`.
#[derive(Debug)]
pub struct HttpQuotes {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(rename = "companyName")]
    company_name: String,
    #[serde(rename = "latestPrice")]
    latest_price: f64,
}

impl HttpQuotes {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn lookup(&self, symbol: &str) -> Option<Quote> {
        let url = format!("{}/stock/{}/quote", self.base_url, symbol);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token)]);
        }

        let response = match request.send().await {
            Ok(r) => r,
            Err(err) => {
                log::warn!("quote lookup for {symbol} failed: {err}");
                return None;
            }
        };
        if !response.status().is_success() {
            log::warn!("quote lookup for {symbol} returned {}", response.status());
            return None;
        }

        let body: QuoteResponse = match response.json().await {
            Ok(b) => b,
            Err(err) => {
                log::warn!("quote response for {symbol} was malformed: {err}");
                return None;
            }
        };

        Some(Quote {
            symbol: symbol.to_string(),
            name: body.company_name,
            price: (body.latest_price * 100.0).round() as Cents,
        })
    }
}

/// Fixed quote table keyed by uppercase symbol.
#[derive(Debug, Default)]
pub struct FixedQuotes {
    table: HashMap<String, (String, Cents)>,
}

impl FixedQuotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small built-in table so the service runs without a provider
    /// configured.
    pub fn demo() -> Self {
        let mut quotes = Self::new();
        quotes.insert("AAPL", "Apple Inc.", 195_50);
        quotes.insert("AMZN", "Amazon.com Inc.", 187_75);
        quotes.insert("MSFT", "Microsoft Corporation", 410_10);
        quotes.insert("NFLX", "Netflix Inc.", 630_25);
        quotes.insert("TSLA", "Tesla Inc.", 243_60);
        quotes
    }

    pub fn insert(&mut self, symbol: &str, name: &str, price: Cents) {
        self.table
            .insert(symbol.to_uppercase(), (name.to_string(), price));
    }

    fn lookup(&self, symbol: &str) -> Option<Quote> {
        self.table.get(symbol).map(|(name, price)| Quote {
            symbol: symbol.to_string(),
            name: name.clone(),
            price: *price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::FixedQuotes;

    #[tokio::test]
    async fn fixed_lookup_is_case_insensitive() {
        let source = super::QuoteSource::Fixed(FixedQuotes::demo());
        let quote = source.lookup("aapl").await.unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.name, "Apple Inc.");
    }

    #[tokio::test]
    async fn unknown_symbol_is_none() {
        let source = super::QuoteSource::Fixed(FixedQuotes::demo());
        assert!(source.lookup("ZZZZ").await.is_none());
        assert!(source.lookup("  ").await.is_none());
    }
}
