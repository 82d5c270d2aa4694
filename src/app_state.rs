//! Shared application state

use crate::auth::{CredentialScheme, PlaintextScheme};
use crate::config::Config;
use crate::db;
use crate::error::Result;
use sqlx::AnyPool;
use std::sync::Arc;

/// State injected into every handler.
///
/// The pool is the only shared mutable resource; it is acquired and
/// released per statement with a bounded number of simultaneous
/// connections.
pub struct AppState {
    pub pool: AnyPool,
    pub config: Arc<Config>,
    pub credentials: Arc<dyn CredentialScheme>,
}

impl AppState {
    /// Build state around an existing pool (used by tests).
    pub fn with_pool(pool: AnyPool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            credentials: Arc::new(PlaintextScheme),
        }
    }
}

/// Connect the pool, bootstrap the schema and prepare the upload
/// directory.
pub async fn create_app_state(config: Config) -> Result<Arc<AppState>> {
    let pool = db::connect_pool(&config.database).await?;
    db::init_schema(&pool).await?;

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    Ok(Arc::new(AppState {
        pool,
        config: Arc::new(config),
        credentials: Arc::new(PlaintextScheme),
    }))
}
