//! Portfolio derivation: positions summed out of the ledger, joined with
//! live quotes. Testable without HTTP.

use thiserror::Error;
use uuid::Uuid;

use crate::ledger::SharedLedger;
use crate::quotes::QuoteSource;
use crate::types::money::format_usd;
use crate::types::portfolio::{Holding, PortfolioView};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortfolioError {
    #[error("no quote for {symbol}")]
    UnknownSymbol { symbol: String },
    #[error("no account for user")]
    UnknownAccount,
}

/// Build a user's portfolio: every nonzero position valued at its fresh
/// quote, plus cash, plus the grand total. As a side effect the matching
/// ledger records get their display-cache fields refreshed; callers mirror
/// those strings to the database if one is configured.
///
/// Quote lookups run outside any ledger lock. Prices are inputs, not shared
/// state, so a quote racing a concurrent trade only changes which instant
/// the valuation reflects.
pub async fn portfolio_view(
    ledger: &SharedLedger,
    quotes: &QuoteSource,
    user_id: Uuid,
) -> Result<PortfolioView, PortfolioError> {
    let (cash, positions) = {
        let guard = ledger.read().await;
        let cash = guard
            .cash_balance(user_id)
            .ok_or(PortfolioError::UnknownAccount)?;
        (cash, guard.positions(user_id))
    };

    let mut holdings = Vec::with_capacity(positions.len());
    for (symbol, shares) in positions {
        let quote =
            quotes
                .lookup(&symbol)
                .await
                .ok_or_else(|| PortfolioError::UnknownSymbol {
                    symbol: symbol.clone(),
                })?;
        holdings.push(Holding {
            symbol,
            name: quote.name,
            shares,
            price: quote.price,
            value: shares * quote.price,
        });
    }

    let total = cash + holdings.iter().map(|h| h.value).sum::<i64>();

    {
        let mut guard = ledger.write().await;
        for h in &holdings {
            guard.refresh_display_cache(
                user_id,
                &h.symbol,
                &format_usd(h.price),
                &format_usd(h.value),
            );
        }
    }

    Ok(PortfolioView {
        cash,
        holdings,
        total,
    })
}
