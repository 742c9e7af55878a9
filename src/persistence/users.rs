//! User persistence: insert, list for hydration, cash and password updates.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::types::money::Cents;

/// Row returned from DB (username is stored lowercase).
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub cash: Cents,
}

/// List all users for hydration.
pub async fn list_users(pool: &PgPool) -> Result<Vec<UserRow>, sqlx::Error> {
    let rows =
        sqlx::query_as::<_, UserRow>("SELECT id, username, password_hash, cash FROM users")
            .fetch_all(pool)
            .await?;
    Ok(rows)
}

/// Insert a user. Username must already be lowercase.
pub async fn insert_user(
    pool: &PgPool,
    id: Uuid,
    username: &str,
    password_hash: &str,
    cash: Cents,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id, username, password_hash, cash) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(username)
        .bind(password_hash)
        .bind(cash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Overwrite a user's cash balance after a trade settles.
pub async fn update_user_cash(pool: &PgPool, id: Uuid, cash: Cents) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET cash = $1 WHERE id = $2")
        .bind(cash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Overwrite a user's password hash after a reset.
pub async fn update_user_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
