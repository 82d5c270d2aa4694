//! sell_in metrics: one row per (year, month)

use super::MaybeField;
use crate::error::Result;
use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::AnyPool;
use sqlx::Row;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SellInMetric {
    pub year: i32,
    pub month: i32,
    pub value: Option<f64>,
    pub meta: Option<f64>,
}

fn hydrate(row: AnyRow) -> Result<SellInMetric> {
    Ok(SellInMetric {
        year: row.try_get("year")?,
        month: row.try_get("month")?,
        value: row.try_get("value")?,
        meta: row.try_get("meta")?,
    })
}

/// All metrics ordered by year, then month.
pub async fn list(pool: &AnyPool) -> Result<Vec<SellInMetric>> {
    let rows = sqlx::query(
        "SELECT `year`, `month`, `value`, `meta` FROM sell_in ORDER BY `year`, `month`",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(hydrate).collect()
}

/// Merge-upsert keyed by (year, month).
pub async fn upsert(
    pool: &AnyPool,
    year: i32,
    month: i32,
    value: MaybeField,
    meta: MaybeField,
) -> Result<()> {
    super::merge_upsert(pool, "sell_in", year, month, &[("value", value), ("meta", meta)]).await
}
