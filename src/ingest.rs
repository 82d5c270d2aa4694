//! CSV ingestion pipeline
//!
//! One generic pipeline, parameterized by a per-table profile: each
//! target names its table, deserializes a raw CSV row, transforms it into
//! a validated row, and binds the insert statement. Malformed rows are
//! skipped with a logged reason, uniformly across targets.
//!
//! Replacing a table is full-replace: a `DELETE` followed by one
//! parameterized `INSERT` per row, all inside a single transaction so API
//! readers never observe a partially emptied table.

use crate::error::Result;
use crate::month::Month;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sqlx::any::AnyArguments;
use sqlx::AnyPool;
use sqlx::query::Query;
use sqlx::Any;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub type AnyQuery<'q> = Query<'q, Any, AnyArguments<'q>>;

/// Per-table ingestion profile.
pub trait CsvTarget {
    /// Row shape as it appears in the CSV file.
    type Raw: DeserializeOwned;
    /// Validated row ready for insertion.
    type Row: Send + Sync;

    const TABLE: &'static str;

    /// Validate and map one raw row; `Err` carries the skip reason.
    fn transform(raw: Self::Raw) -> std::result::Result<Self::Row, String>;

    /// Post-parse pass over the whole file before insertion.
    fn finalize(rows: Vec<Self::Row>) -> Vec<Self::Row> {
        rows
    }

    fn insert_sql() -> &'static str;

    fn bind<'q>(query: AnyQuery<'q>, row: &'q Self::Row) -> AnyQuery<'q>;
}

/// Parse CSV contents into validated rows, skipping and logging malformed
/// ones.
pub fn parse_rows<T: CsvTarget>(contents: &str) -> Result<Vec<T::Row>> {
    let mut reader = csv::Reader::from_reader(contents.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<T::Raw>().enumerate() {
        // Header occupies line 1
        let line = index + 2;
        match record {
            Ok(raw) => match T::transform(raw) {
                Ok(row) => rows.push(row),
                Err(reason) => {
                    warn!(table = T::TABLE, line, "skipping row: {}", reason);
                },
            },
            Err(e) => {
                warn!(table = T::TABLE, line, "skipping malformed row: {}", e);
            },
        }
    }

    Ok(T::finalize(rows))
}

/// Replace the target table's contents with the rows parsed from `path`.
///
/// Clear and inserts commit or roll back together.
pub async fn replace_from_csv<T: CsvTarget>(pool: &AnyPool, path: &Path) -> Result<usize> {
    // Read the whole file off the runtime thread, parse from the buffer.
    let contents = tokio::fs::read_to_string(path).await?;
    let rows = parse_rows::<T>(&contents)?;

    let mut tx = pool.begin().await?;

    let clear_sql = format!("DELETE FROM {}", T::TABLE);
    sqlx::query(&clear_sql).execute(&mut *tx).await?;

    for row in &rows {
        T::bind(sqlx::query(T::insert_sql()), row).execute(&mut *tx).await?;
    }

    tx.commit().await?;

    info!(table = T::TABLE, rows = rows.len(), "table replaced");
    Ok(rows.len())
}

// ============================================================================
// sell_in_rivera: pass-through of the 14 order-line columns
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RiveraRow {
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
    #[serde(rename = "Pedido SAP", default)]
    pub pedido_sap: String,
    #[serde(rename = "Estatus", default)]
    pub estatus: String,
}

pub struct RiveraTarget;

impl CsvTarget for RiveraTarget {
    type Raw = RiveraRow;
    type Row = RiveraRow;

    const TABLE: &'static str = "sell_in_rivera";

    fn transform(raw: Self::Raw) -> std::result::Result<Self::Row, String> {
        Ok(raw)
    }

    fn insert_sql() -> &'static str {
        "INSERT INTO sell_in_rivera (
            `Folio`, `Fecha Ord.`, `Suc`, `Nombre`, `Clave`, `Producto`,
            `Presentacion`, `Cant. Ord.`, `Cant. Pend.`, `Cant. Surt.`,
            `Fill Rate`, `Sell In Pzas`, `Pedido SAP`, `Estatus`
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    }

    fn bind<'q>(query: AnyQuery<'q>, row: &'q Self::Row) -> AnyQuery<'q> {
        query
            .bind(row.folio.as_str())
            .bind(row.fecha_ord.as_str())
            .bind(row.suc.as_str())
            .bind(row.nombre.as_str())
            .bind(row.clave.as_str())
            .bind(row.producto.as_str())
            .bind(row.presentacion.as_str())
            .bind(row.cant_ord.as_str())
            .bind(row.cant_pend.as_str())
            .bind(row.cant_surt.as_str())
            .bind(row.fill_rate.as_str())
            .bind(row.sell_in_pzas.as_str())
            .bind(row.pedido_sap.as_str())
            .bind(row.estatus.as_str())
    }
}

// ============================================================================
// sell_in_cash: typed pass-through of the cash figures
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CashRow {
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

pub struct CashTarget;

impl CsvTarget for CashTarget {
    type Raw = CashRow;
    type Row = CashRow;

    const TABLE: &'static str = "sell_in_cash";

    fn transform(raw: Self::Raw) -> std::result::Result<Self::Row, String> {
        Ok(raw)
    }

    fn insert_sql() -> &'static str {
        "INSERT INTO sell_in_cash (
            `Ano`, `Mes`, `Clave`, `Descripcion`, `CompraCaja`, `VentaCaja`,
            `CompraMXN`, `VentaMXN`, `CompraPiezas`, `VentaPiezas`
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
    }

    fn bind<'q>(query: AnyQuery<'q>, row: &'q Self::Row) -> AnyQuery<'q> {
        query
            .bind(row.ano)
            .bind(row.mes.as_str())
            .bind(row.clave.as_str())
            .bind(row.descripcion.as_str())
            .bind(row.compra_caja)
            .bind(row.venta_caja)
            .bind(row.compra_mxn)
            .bind(row.venta_mxn)
            .bind(row.compra_piezas)
            .bind(row.venta_piezas)
    }
}

// ============================================================================
// sell_in: month-name resolution into the (year, month) metric table
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SellInRaw {
    #[serde(rename = "Ano", default)]
    pub ano: String,
    #[serde(rename = "Mes", default)]
    pub mes: String,
    #[serde(rename = "CompraPiezas", default)]
    pub compra_piezas: String,
    #[serde(rename = "VentaPiezas", default)]
    pub venta_piezas: String,
}

#[derive(Debug, Clone)]
pub struct SellInRow {
    pub year: i32,
    pub month: Month,
    pub value: f64,
    pub meta: f64,
}

/// Empty cells default to 0; anything non-numeric is a skip reason.
fn parse_metric(field: &str, raw: &str) -> std::result::Result<f64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| format!("unparseable {}: {:?}", field, raw))
}

pub struct SellInTarget;

impl CsvTarget for SellInTarget {
    type Raw = SellInRaw;
    type Row = SellInRow;

    const TABLE: &'static str = "sell_in";

    fn transform(raw: Self::Raw) -> std::result::Result<Self::Row, String> {
        let year = raw
            .ano
            .trim()
            .parse::<i32>()
            .map_err(|_| format!("unparseable year: {:?}", raw.ano))?;
        let month = Month::from_name(&raw.mes)
            .ok_or_else(|| format!("unknown month name: {:?}", raw.mes))?;
        let value = parse_metric("CompraPiezas", &raw.compra_piezas)?;
        let meta = parse_metric("VentaPiezas", &raw.venta_piezas)?;

        Ok(SellInRow { year, month, value, meta })
    }

    /// Duplicate (year, month) rows within one file: the last row wins.
    fn finalize(mut rows: Vec<Self::Row>) -> Vec<Self::Row> {
        let mut seen = HashSet::new();
        rows.reverse();
        rows.retain(|row| seen.insert((row.year, row.month)));
        rows.reverse();
        rows
    }

    fn insert_sql() -> &'static str {
        "INSERT INTO sell_in (`year`, `month`, `value`, `meta`) VALUES (?, ?, ?, ?)"
    }

    fn bind<'q>(query: AnyQuery<'q>, row: &'q Self::Row) -> AnyQuery<'q> {
        query
            .bind(row.year)
            .bind(row.month.ordinal() as i32)
            .bind(row.value)
            .bind(row.meta)
    }
}
