//! sell_in_rivera order lines with date-range listing

use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::AnyPool;
use sqlx::Row;

/// One order line; JSON keys match the stored column names.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SalesOrderRecord {
    #[serde(rename = "Folio")]
    pub folio: String,
    #[serde(rename = "Fecha Ord.")]
    pub fecha_ord: String,
    #[serde(rename = "Suc")]
    pub suc: String,
    #[serde(rename = "Nombre")]
    pub nombre: String,
    #[serde(rename = "Clave")]
    pub clave: String,
    #[serde(rename = "Producto")]
    pub producto: String,
    #[serde(rename = "Presentacion")]
    pub presentacion: String,
    #[serde(rename = "Cant. Ord.")]
    pub cant_ord: String,
    #[serde(rename = "Cant. Pend.")]
    pub cant_pend: String,
    #[serde(rename = "Cant. Surt.")]
    pub cant_surt: String,
    #[serde(rename = "Fill Rate")]
    pub fill_rate: String,
    #[serde(rename = "Sell In Pzas")]
    pub sell_in_pzas: String,
    #[serde(rename = "Pedido SAP")]
    pub pedido_sap: String,
    #[serde(rename = "Estatus")]
    pub estatus: String,
}

fn hydrate(row: AnyRow) -> Result<SalesOrderRecord> {
    Ok(SalesOrderRecord {
        folio: row.try_get("Folio")?,
        fecha_ord: row.try_get("Fecha Ord.")?,
        suc: row.try_get("Suc")?,
        nombre: row.try_get("Nombre")?,
        clave: row.try_get("Clave")?,
        producto: row.try_get("Producto")?,
        presentacion: row.try_get("Presentacion")?,
        cant_ord: row.try_get("Cant. Ord.")?,
        cant_pend: row.try_get("Cant. Pend.")?,
        cant_surt: row.try_get("Cant. Surt.")?,
        fill_rate: row.try_get("Fill Rate")?,
        sell_in_pzas: row.try_get("Sell In Pzas")?,
        pedido_sap: row.try_get("Pedido SAP")?,
        estatus: row.try_get("Estatus")?,
    })
}

/// Parse the stored `DD/MM/YYYY` text date.
fn order_date(record: &SalesOrderRecord) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(record.fecha_ord.trim(), "%d/%m/%Y").ok()
}

/// Order lines whose date falls inclusively in [from, to], ordered by
/// date then folio. Rows whose date does not parse are excluded, matching
/// the legacy NULL-date behavior.
///
/// Filtering happens over the chrono-parsed dates rather than in
/// dialect-specific SQL; the table is an admin-scale reload target.
pub async fn list_range(
    pool: &AnyPool,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<SalesOrderRecord>> {
    let rows = sqlx::query(
        "SELECT `Folio`, `Fecha Ord.`, `Suc`, `Nombre`, `Clave`, `Producto`,
                `Presentacion`, `Cant. Ord.`, `Cant. Pend.`, `Cant. Surt.`,
                `Fill Rate`, `Sell In Pzas`, `Pedido SAP`, `Estatus`
         FROM sell_in_rivera",
    )
    .fetch_all(pool)
    .await?;

    let mut records: Vec<(NaiveDate, SalesOrderRecord)> = Vec::new();
    for row in rows {
        let record = hydrate(row)?;
        if let Some(date) = order_date(&record) {
            if date >= from && date <= to {
                records.push((date, record));
            }
        }
    }

    records.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.folio.cmp(&b.1.folio)));
    Ok(records.into_iter().map(|(_, r)| r).collect())
}
