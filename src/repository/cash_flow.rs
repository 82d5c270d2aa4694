//! sell_in_cash figures with month-name-aware ordering and accumulation

use crate::error::Result;
use crate::month::{self, Month};
use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::AnyPool;
use sqlx::Row;

/// One cash row; JSON keys match the stored column names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CashFlowRecord {
    #[serde(rename = "Ano")]
    pub ano: i32,
    #[serde(rename = "Mes")]
    pub mes: String,
    #[serde(rename = "Clave")]
    pub clave: String,
    #[serde(rename = "Descripcion")]
    pub descripcion: String,
    #[serde(rename = "CompraCaja")]
    pub compra_caja: f64,
    #[serde(rename = "VentaCaja")]
    pub venta_caja: f64,
    #[serde(rename = "CompraMXN")]
    pub compra_mxn: f64,
    #[serde(rename = "VentaMXN")]
    pub venta_mxn: f64,
    #[serde(rename = "CompraPiezas")]
    pub compra_piezas: f64,
    #[serde(rename = "VentaPiezas")]
    pub venta_piezas: f64,
}

/// Six prefix sums; zeros (never nulls) when no rows match.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CashTotals {
    #[serde(rename = "totalVentaMXN")]
    pub venta_mxn: f64,
    #[serde(rename = "totalCompraMXN")]
    pub compra_mxn: f64,
    #[serde(rename = "totalCompraCaja")]
    pub compra_caja: f64,
    #[serde(rename = "totalVentaCaja")]
    pub venta_caja: f64,
    #[serde(rename = "totalCompraPiezas")]
    pub compra_piezas: f64,
    #[serde(rename = "totalVentaPiezas")]
    pub venta_piezas: f64,
}

const COLUMNS: &str = "`Ano`, `Mes`, `Clave`, `Descripcion`, `CompraCaja`, `VentaCaja`, \
                       `CompraMXN`, `VentaMXN`, `CompraPiezas`, `VentaPiezas`";

fn hydrate(row: AnyRow) -> Result<CashFlowRecord> {
    Ok(CashFlowRecord {
        ano: row.try_get("Ano")?,
        mes: row.try_get("Mes")?,
        clave: row.try_get("Clave")?,
        descripcion: row.try_get("Descripcion")?,
        compra_caja: row.try_get("CompraCaja")?,
        venta_caja: row.try_get("VentaCaja")?,
        compra_mxn: row.try_get("CompraMXN")?,
        venta_mxn: row.try_get("VentaMXN")?,
        compra_piezas: row.try_get("CompraPiezas")?,
        venta_piezas: row.try_get("VentaPiezas")?,
    })
}

/// All rows ordered by year, then month ordinal.
pub async fn list_all(pool: &AnyPool) -> Result<Vec<CashFlowRecord>> {
    let sql = format!(
        "SELECT {} FROM sell_in_cash ORDER BY `Ano`, {}",
        COLUMNS,
        month::sql_ordinal_expr("`Mes`")
    );
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    rows.into_iter().map(hydrate).collect()
}

/// Rows matching exactly one year and month name.
pub async fn list_month(pool: &AnyPool, year: i32, month_name: &str) -> Result<Vec<CashFlowRecord>> {
    let sql = format!(
        "SELECT {} FROM sell_in_cash WHERE `Ano` = ? AND `Mes` = ? ORDER BY {}",
        COLUMNS,
        month::sql_ordinal_expr("`Mes`")
    );
    let rows = sqlx::query(&sql).bind(year).bind(month_name).fetch_all(pool).await?;

    rows.into_iter().map(hydrate).collect()
}

/// Sum the six figures over months 1..=`month` of `year`.
pub async fn accumulate(pool: &AnyPool, year: i32, month: Month) -> Result<CashTotals> {
    let sql = format!(
        "SELECT
            SUM(`VentaMXN`) AS totalVentaMXN,
            SUM(`CompraMXN`) AS totalCompraMXN,
            SUM(`CompraCaja`) AS totalCompraCaja,
            SUM(`VentaCaja`) AS totalVentaCaja,
            SUM(`CompraPiezas`) AS totalCompraPiezas,
            SUM(`VentaPiezas`) AS totalVentaPiezas
         FROM sell_in_cash
         WHERE `Ano` = ? AND {} BETWEEN 1 AND ?",
        month::sql_ordinal_expr("`Mes`")
    );

    let row = sqlx::query(&sql)
        .bind(year)
        .bind(month.ordinal() as i32)
        .fetch_one(pool)
        .await?;

    let sum = |name: &str| -> Result<f64> {
        Ok(row.try_get::<Option<f64>, _>(name)?.unwrap_or(0.0))
    };

    Ok(CashTotals {
        venta_mxn: sum("totalVentaMXN")?,
        compra_mxn: sum("totalCompraMXN")?,
        compra_caja: sum("totalCompraCaja")?,
        venta_caja: sum("totalVentaCaja")?,
        compra_piezas: sum("totalCompraPiezas")?,
        venta_piezas: sum("totalVentaPiezas")?,
    })
}

/// Per-month `SUM(DISTINCT CompraPiezas)` for one year, 0 for months
/// without rows.
pub async fn monthly_series(pool: &AnyPool, year: i32) -> Result<[f64; 12]> {
    // Grouping on the normalized spelling keeps DISTINCT scoped to the
    // whole month, so `Enero` and `enero` rows dedupe against each other
    let rows = sqlx::query(
        "SELECT LOWER(TRIM(`Mes`)) AS mes, SUM(DISTINCT `CompraPiezas`) AS total
         FROM sell_in_cash
         WHERE `Ano` = ?
         GROUP BY LOWER(TRIM(`Mes`))",
    )
    .bind(year)
    .fetch_all(pool)
    .await?;

    let mut series = [0.0; 12];
    for row in rows {
        let mes: String = row.try_get("mes")?;
        let total: Option<f64> = row.try_get("total")?;
        if let Some(m) = Month::from_name(&mes) {
            series[(m.ordinal() - 1) as usize] = total.unwrap_or(0.0);
        }
    }
    Ok(series)
}
