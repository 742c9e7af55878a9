//! Database layer: pool, migrations, and access for users and transactions.
//! The in-memory stores are authoritative; the database is a mirror that
//! survives restarts, reloaded once at startup.

mod pool;
mod transactions;
mod users;

pub use pool::{create_pool_and_migrate, run_migrations};
pub use sqlx::PgPool;
pub use transactions::{
    TransactionRow, insert_transaction, list_transactions, transaction_row_to_record,
    update_transaction_cache,
};
pub use users::{UserRow, insert_user, list_users, update_user_cash, update_user_password};

use crate::api::auth::{UserCredential, UserStore};
use crate::ledger::SharedLedger;

/// Load users and the trade log into the in-memory stores.
pub async fn hydrate(
    pool: &PgPool,
    user_store: &UserStore,
    ledger: &SharedLedger,
) -> Result<(), sqlx::Error> {
    let users = list_users(pool).await?;
    let user_count = users.len();
    {
        let mut store = user_store.write().await;
        let mut guard = ledger.write().await;
        for u in users {
            guard.restore_account(u.id, u.cash);
            store.insert(
                u.username.clone(),
                UserCredential {
                    user_id: u.id,
                    username: u.username,
                    password_hash: u.password_hash,
                },
            );
        }
    }

    let rows = list_transactions(pool).await?;
    let row_count = rows.len();
    let mut guard = ledger.write().await;
    for row in &rows {
        match transaction_row_to_record(row) {
            Some(record) => guard.restore_record(record),
            None => log::warn!("skipping transaction {} with bad direction", row.id),
        }
    }

    log::info!("hydrated {user_count} users and {row_count} transactions");
    Ok(())
}
