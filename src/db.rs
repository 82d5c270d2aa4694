//! Database pool setup and schema bootstrap
//!
//! The `Any` driver keeps one code path for the MySQL deployment target
//! and the SQLite-backed tests; every statement in the crate sticks to
//! the portable subset (backtick-quoted identifiers, `?` placeholders).

use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::Duration;
use tracing::{debug, info};

/// Idempotent bootstrap DDL, one statement per entry.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sell_in_rivera (
        `Folio` TEXT NOT NULL,
        `Fecha Ord.` TEXT NOT NULL,
        `Suc` TEXT NOT NULL,
        `Nombre` TEXT NOT NULL,
        `Clave` TEXT NOT NULL,
        `Producto` TEXT NOT NULL,
        `Presentacion` TEXT NOT NULL,
        `Cant. Ord.` TEXT NOT NULL,
        `Cant. Pend.` TEXT NOT NULL,
        `Cant. Surt.` TEXT NOT NULL,
        `Fill Rate` TEXT NOT NULL,
        `Sell In Pzas` TEXT NOT NULL,
        `Pedido SAP` TEXT NOT NULL,
        `Estatus` TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sell_in_cash (
        `Ano` INTEGER NOT NULL,
        `Mes` TEXT NOT NULL,
        `Clave` TEXT NOT NULL,
        `Descripcion` TEXT NOT NULL,
        `CompraCaja` DOUBLE NOT NULL,
        `VentaCaja` DOUBLE NOT NULL,
        `CompraMXN` DOUBLE NOT NULL,
        `VentaMXN` DOUBLE NOT NULL,
        `CompraPiezas` DOUBLE NOT NULL,
        `VentaPiezas` DOUBLE NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sell_in (
        `year` INTEGER NOT NULL,
        `month` INTEGER NOT NULL,
        `value` DOUBLE,
        `meta` DOUBLE,
        UNIQUE (`year`, `month`)
    )",
    "CREATE TABLE IF NOT EXISTS pedidos (
        `year` INTEGER NOT NULL,
        `month` INTEGER NOT NULL,
        `total_pedido` DOUBLE,
        `facturado` DOUBLE,
        `pendiente_cita` DOUBLE,
        `pendiente_sin_cita` DOUBLE,
        UNIQUE (`year`, `month`)
    )",
    "CREATE TABLE IF NOT EXISTS usuarios (
        `username` VARCHAR(64) NOT NULL,
        `password` VARCHAR(128) NOT NULL,
        `role` VARCHAR(16) NOT NULL
    )",
];

/// Connect a bounded pool and verify the connection with a ping.
pub async fn connect_pool(config: &DatabaseConfig) -> Result<AnyPool> {
    sqlx::any::install_default_drivers();

    let pool = AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.dsn())
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    info!(
        host = %config.host,
        database = %config.name,
        max_connections = config.max_connections,
        "database pool ready"
    );
    Ok(pool)
}

/// Create the tables this service owns when they do not exist yet.
pub async fn init_schema(pool: &AnyPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    debug!("schema bootstrap complete");
    Ok(())
}
