use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::money::Cents;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Buy => "buy",
            Direction::Sell => "sell",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(Direction::Buy),
            "sell" => Some(Direction::Sell),
            _ => None,
        }
    }
}

/// One ledger entry. `shares` is signed: positive = buy, negative = sell.
/// Immutable once appended, except the two display-cache fields which the
/// portfolio view refreshes with formatted strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub direction: Direction,
    pub symbol: String,
    pub shares: i64,
    pub price: Cents,
    pub executed_at: DateTime<Utc>,
    pub last_price: Option<String>,
    pub total_current_value: Option<String>,
}
