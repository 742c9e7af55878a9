//! Accounts and the append-only trade log. The whole check-append-settle
//! sequence for a trade runs inside one write-lock critical section, so a
//! balance or position can never be spent twice by concurrent requests.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::types::money::Cents;
use crate::types::trade::{Direction, TradeRecord};

pub type SharedLedger = Arc<RwLock<Ledger>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TradeError {
    #[error("not enough cash")]
    InsufficientFunds { required: Cents, available: Cents },
    #[error("trying to sell more shares than owned")]
    InsufficientShares { requested: i64, held: i64 },
    #[error("share count must be positive")]
    InvalidShareCount { shares: i64 },
    #[error("no account for user")]
    UnknownAccount,
}

#[derive(Debug, Default)]
pub struct Ledger {
    cash: BTreeMap<Uuid, Cents>,
    records: Vec<TradeRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with its starting balance. Idempotent for an existing
    /// account: the balance is left alone.
    pub fn open_account(&mut self, user_id: Uuid, starting_cash: Cents) {
        self.cash.entry(user_id).or_insert(starting_cash);
    }

    pub fn cash_balance(&self, user_id: Uuid) -> Option<Cents> {
        self.cash.get(&user_id).copied()
    }

    /// Net share count for (user, symbol): the sum of signed shares over the
    /// whole log. Symbols compare uppercased.
    pub fn position(&self, user_id: Uuid, symbol: &str) -> i64 {
        let symbol = symbol.to_uppercase();
        self.records
            .iter()
            .filter(|r| r.user_id == user_id && r.symbol == symbol)
            .map(|r| r.shares)
            .sum()
    }

    /// Every nonzero position for a user, sorted by symbol.
    pub fn positions(&self, user_id: Uuid) -> Vec<(String, i64)> {
        let mut by_symbol: BTreeMap<&str, i64> = BTreeMap::new();
        for r in self.records.iter().filter(|r| r.user_id == user_id) {
            *by_symbol.entry(r.symbol.as_str()).or_insert(0) += r.shares;
        }
        by_symbol
            .into_iter()
            .filter(|(_, shares)| *shares != 0)
            .map(|(symbol, shares)| (symbol.to_string(), shares))
            .collect()
    }

    /// Full trade history for a user, oldest first.
    pub fn history(&self, user_id: Uuid) -> Vec<TradeRecord> {
        self.records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Record a trade: validate against the current balance/position, append
    /// the record, and settle cash. Callers resolve the unit price from the
    /// quote source first; `shares` is the requested count and must be
    /// positive.
    ///
    /// The caller holds the write guard, so the check and the mutation are a
    /// single atomic step. On any error the ledger is untouched.
    pub fn record_trade(
        &mut self,
        user_id: Uuid,
        symbol: &str,
        shares: i64,
        direction: Direction,
        price: Cents,
    ) -> Result<TradeRecord, TradeError> {
        if shares <= 0 {
            return Err(TradeError::InvalidShareCount { shares });
        }
        let balance = self
            .cash
            .get(&user_id)
            .copied()
            .ok_or(TradeError::UnknownAccount)?;
        // An amount that overflows i64 saturates and fails the funds check.
        let amount = shares.checked_mul(price).unwrap_or(Cents::MAX);

        let signed_shares = match direction {
            Direction::Buy => {
                if amount > balance {
                    return Err(TradeError::InsufficientFunds {
                        required: amount,
                        available: balance,
                    });
                }
                shares
            }
            Direction::Sell => {
                let held = self.position(user_id, symbol);
                if shares > held {
                    return Err(TradeError::InsufficientShares {
                        requested: shares,
                        held,
                    });
                }
                -shares
            }
        };

        let record = TradeRecord {
            id: Uuid::new_v4(),
            user_id,
            direction,
            symbol: symbol.to_uppercase(),
            shares: signed_shares,
            price,
            executed_at: Utc::now(),
            last_price: None,
            total_current_value: None,
        };
        self.records.push(record.clone());

        let new_balance = match direction {
            Direction::Buy => balance - amount,
            Direction::Sell => balance.saturating_add(amount),
        };
        self.cash.insert(user_id, new_balance);

        Ok(record)
    }

    /// Overwrite the display-cache fields on every record for (user, symbol).
    /// Purely a rendering artifact; nothing reads these back for computation.
    pub fn refresh_display_cache(
        &mut self,
        user_id: Uuid,
        symbol: &str,
        last_price: &str,
        total_current_value: &str,
    ) {
        let symbol = symbol.to_uppercase();
        for r in self
            .records
            .iter_mut()
            .filter(|r| r.user_id == user_id && r.symbol == symbol)
        {
            r.last_price = Some(last_price.to_string());
            r.total_current_value = Some(total_current_value.to_string());
        }
    }

    /// Restore a record loaded from the database. Skips balance settlement:
    /// hydrated balances come from the users table.
    pub fn restore_record(&mut self, record: TradeRecord) {
        self.records.push(record);
    }

    /// Restore an account balance loaded from the database.
    pub fn restore_account(&mut self, user_id: Uuid, cash: Cents) {
        self.cash.insert(user_id, cash);
    }
}
