//! Trade-log persistence: insert on trade, list for hydration, and the
//! display-cache columns the portfolio view refreshes.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::types::trade::{Direction, TradeRecord};

#[derive(Debug, FromRow)]
pub struct TransactionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub direction: String,
    pub symbol: String,
    pub shares: i64,
    pub price: i64,
    pub last_price: Option<String>,
    pub total_current_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Convert a row to a ledger record. Skips rows with an unknown direction.
pub fn transaction_row_to_record(row: &TransactionRow) -> Option<TradeRecord> {
    let direction = Direction::parse(&row.direction)?;
    Some(TradeRecord {
        id: row.id,
        user_id: row.user_id,
        direction,
        symbol: row.symbol.clone(),
        shares: row.shares,
        price: row.price,
        executed_at: row.created_at,
        last_price: row.last_price.clone(),
        total_current_value: row.total_current_value.clone(),
    })
}

/// Insert a single trade (call after the in-memory append commits).
pub async fn insert_transaction(pool: &PgPool, record: &TradeRecord) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO transactions (id, user_id, direction, symbol, shares, price, last_price, total_current_value, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(record.id)
    .bind(record.user_id)
    .bind(record.direction.as_str())
    .bind(&record.symbol)
    .bind(record.shares)
    .bind(record.price)
    .bind(&record.last_price)
    .bind(&record.total_current_value)
    .bind(record.executed_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// List the whole trade log, oldest first, for hydration.
pub async fn list_transactions(pool: &PgPool) -> Result<Vec<TransactionRow>, sqlx::Error> {
    let rows = sqlx::query_as::<_, TransactionRow>(
        "SELECT id, user_id, direction, symbol, shares, price, last_price, total_current_value, created_at \
         FROM transactions ORDER BY created_at",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Refresh the display-cache columns for every row of (user, symbol).
pub async fn update_transaction_cache(
    pool: &PgPool,
    user_id: Uuid,
    symbol: &str,
    last_price: &str,
    total_current_value: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE transactions SET last_price = $1, total_current_value = $2 \
         WHERE user_id = $3 AND symbol = $4",
    )
    .bind(last_price)
    .bind(total_current_value)
    .bind(user_id)
    .bind(symbol)
    .execute(pool)
    .await?;
    Ok(())
}
