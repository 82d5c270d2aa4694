//! usuarios lookups (read-only)

use crate::error::Result;
use sqlx::AnyPool;
use sqlx::Row;

#[derive(Debug, Clone)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub role: String,
}

pub async fn find_by_username(pool: &AnyPool, username: &str) -> Result<Option<UserAccount>> {
    let row = sqlx::query(
        "SELECT `username`, `password`, `role` FROM usuarios WHERE `username` = ?",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(UserAccount {
            username: row.try_get("username")?,
            password: row.try_get("password")?,
            role: row.try_get("role")?,
        })),
        None => Ok(None),
    }
}
