//! pedidos order summaries: one row per (year, month)

use super::MaybeField;
use crate::error::Result;
use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::AnyPool;
use sqlx::Row;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrdersSummary {
    pub year: i32,
    pub month: i32,
    pub total_pedido: Option<f64>,
    pub facturado: Option<f64>,
    pub pendiente_cita: Option<f64>,
    pub pendiente_sin_cita: Option<f64>,
}

/// Incoming summary fields for an upsert.
#[derive(Debug, Clone, Default)]
pub struct OrdersUpdate {
    pub total_pedido: MaybeField,
    pub facturado: MaybeField,
    pub pendiente_cita: MaybeField,
    pub pendiente_sin_cita: MaybeField,
}

fn hydrate(row: AnyRow) -> Result<OrdersSummary> {
    Ok(OrdersSummary {
        year: row.try_get("year")?,
        month: row.try_get("month")?,
        total_pedido: row.try_get("total_pedido")?,
        facturado: row.try_get("facturado")?,
        pendiente_cita: row.try_get("pendiente_cita")?,
        pendiente_sin_cita: row.try_get("pendiente_sin_cita")?,
    })
}

/// All summaries ordered by year, then month.
pub async fn list(pool: &AnyPool) -> Result<Vec<OrdersSummary>> {
    let rows = sqlx::query(
        "SELECT `year`, `month`, `total_pedido`, `facturado`, `pendiente_cita`,
                `pendiente_sin_cita`
         FROM pedidos ORDER BY `year`, `month`",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(hydrate).collect()
}

/// Merge-upsert keyed by (year, month).
pub async fn upsert(pool: &AnyPool, year: i32, month: i32, update: OrdersUpdate) -> Result<()> {
    super::merge_upsert(
        pool,
        "pedidos",
        year,
        month,
        &[
            ("total_pedido", update.total_pedido),
            ("facturado", update.facturado),
            ("pendiente_cita", update.pendiente_cita),
            ("pendiente_sin_cita", update.pendiente_sin_cita),
        ],
    )
    .await
}
