//! reportsrv library
//!
//! Administrative backend for sales-reporting data: CSV ingestion with
//! full-table replace, month-ordinal-aware reporting queries, and
//! natural-key merge-upserts, served over HTTP/JSON.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod month;
pub mod repository;
pub mod routes;
pub mod upload;

// Re-export commonly used types
pub use app_state::{create_app_state, AppState};
pub use config::Config;
pub use error::{ReportSrvError, Result};
pub use month::Month;
pub use routes::create_routes;
