use serde::{Deserialize, Serialize};

use crate::types::money::Cents;

/// One open position joined with its live quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: Cents,
    pub value: Cents,
}

/// Snapshot of a user's portfolio: cash plus every nonzero position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioView {
    pub cash: Cents,
    pub holdings: Vec<Holding>,
    pub total: Cents,
}
