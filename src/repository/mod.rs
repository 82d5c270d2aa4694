//! SQL persistence, one module per entity
//!
//! Rows are hydrated by hand with `try_get` so the same code runs against
//! MySQL and SQLite through the `Any` driver.

pub mod cash_flow;
pub mod pedidos;
pub mod rivera;
pub mod sell_in;
pub mod users;

use crate::error::Result;
use sqlx::AnyPool;

/// An incoming numeric field in a merge-upsert.
///
/// `None` = absent (preserve stored), `Some(None)` = explicit null,
/// `Some(Some(v))` = explicit value (including zero). Absent, null and
/// zero are three distinct states and must stay that way.
pub type MaybeField = Option<Option<f64>>;

/// Insert-or-update keyed by (year, month).
///
/// The insert is attempted first; a unique-constraint conflict means the
/// row already exists, so only the explicitly provided fields are written
/// over it. Absent fields are stored as NULL on insert and never null out
/// a previously stored value on update. Relying on the constraint instead
/// of a read-then-write probe keeps concurrent first writes of the same
/// key from surfacing the conflict to the caller.
pub(crate) async fn merge_upsert(
    pool: &AnyPool,
    table: &str,
    year: i32,
    month: i32,
    fields: &[(&str, MaybeField)],
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let columns: Vec<String> =
        fields.iter().map(|(col, _)| format!("`{}`", col)).collect();
    let placeholders: Vec<&str> = fields.iter().map(|_| "?").collect();
    let insert_sql = format!(
        "INSERT INTO {} (`year`, `month`, {}) VALUES (?, ?, {})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    );

    let mut insert = sqlx::query(&insert_sql).bind(year).bind(month);
    for (_, value) in fields {
        insert = insert.bind(value.flatten());
    }

    match insert.execute(&mut *tx).await {
        Ok(_) => {}
        Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
            let provided: Vec<&(&str, MaybeField)> =
                fields.iter().filter(|(_, v)| v.is_some()).collect();

            if !provided.is_empty() {
                let assignments: Vec<String> =
                    provided.iter().map(|(col, _)| format!("`{}` = ?", col)).collect();
                let update_sql = format!(
                    "UPDATE {} SET {} WHERE `year` = ? AND `month` = ?",
                    table,
                    assignments.join(", ")
                );

                let mut update = sqlx::query(&update_sql);
                for (_, value) in &provided {
                    update = update.bind(value.flatten());
                }
                update.bind(year).bind(month).execute(&mut *tx).await?;
            }
        }
        Err(err) => return Err(err.into()),
    }

    tx.commit().await?;
    Ok(())
}
