//! API routes and handlers
//!
//! Request flow per endpoint: parse input, validate required fields,
//! call into ingest/repository, shape the JSON response.

use crate::app_state::AppState;
use crate::error::{invalid_input, ReportSrvError, Result};
use crate::ingest::{self, CashTarget, RiveraTarget, SellInTarget};
use crate::month::Month;
use crate::repository::{cash_flow, pedidos, rivera, sell_in, users};
use crate::upload::TempUpload;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;

/// Years covered by the purchased-pieces series endpoint.
const SERIES_YEARS: [i32; 3] = [2023, 2024, 2025];

/// Create all API routes with state
pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/api/upload-sell-in-rivera", post(upload_sell_in_rivera))
        .route("/api/upload-sell-in-cash", post(upload_sell_in_cash))
        .route("/api/upload-sell-in", post(upload_sell_in))
        .route("/api/sell-in", get(get_sell_in).put(put_sell_in))
        .route("/api/sell-in-rivera", get(get_sell_in_rivera))
        .route("/api/pedidos", get(get_pedidos).put(put_pedidos))
        .route("/api/sell-in-cash", get(get_sell_in_cash))
        .route("/api/sell-in-cash-accumulated", get(get_sell_in_cash_accumulated))
        .route("/api/compra-piezas-by-year", get(get_compra_piezas_by_year))
        .route("/api/login", post(login))
        .route("/api-docs/openapi.json", get(openapi_json))
        // CSV reloads comfortably exceed the 2 MB default
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(crate::logging::http_request_logger))
        .with_state(state)
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        upload_sell_in_rivera,
        upload_sell_in_cash,
        upload_sell_in,
        get_sell_in,
        put_sell_in,
        get_sell_in_rivera,
        get_pedidos,
        put_pedidos,
        get_sell_in_cash,
        get_sell_in_cash_accumulated,
        get_compra_piezas_by_year,
        login
    ),
    tags(
        (name = "reportsrv", description = "Sales reporting ingestion and queries")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// ============================================================================
// Request shapes
// ============================================================================

/// Distinguishes an absent JSON field (outer `None`) from an explicit
/// `null` (inner `None`). Used everywhere the merge-upsert semantics
/// depend on absent vs null vs zero.
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct SellInUpdateRequest {
    pub year: Option<i32>,
    pub month: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub value: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub meta: Option<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct PedidosUpdateRequest {
    pub year: Option<i32>,
    pub month: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub total_pedido: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub facturado: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pendiente_cita: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub pendiente_sin_cita: Option<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    #[serde(rename = "fechaInicial")]
    pub fecha_inicial: Option<String>,
    #[serde(rename = "fechaFinal")]
    pub fecha_final: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CashQuery {
    pub year: Option<i32>,
    pub month: Option<String>,
    pub accumulate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

fn require_key(year: Option<i32>, month: Option<i32>) -> Result<(i32, i32)> {
    let year = year.ok_or_else(|| invalid_input("year and month are required"))?;
    let month = month.ok_or_else(|| invalid_input("year and month are required"))?;
    if Month::from_ordinal(month).is_none() {
        return Err(invalid_input("month must be between 1 and 12"));
    }
    Ok((year, month))
}

fn parse_date(name: &str, raw: Option<&str>) -> Result<NaiveDate> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| invalid_input("fechaInicial and fechaFinal are required"))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| invalid_input(&format!("{} must be a YYYY-MM-DD date", name)))
}

// ============================================================================
// Handlers
// ============================================================================

/// Plain-text liveness probe
async fn index() -> &'static str {
    "Backend is working!"
}

/// Service health summary
async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let db_ok = sqlx::query("SELECT 1").fetch_one(&state.pool).await.is_ok();

    Ok(Json(json!({
        "status": if db_ok { "healthy" } else { "degraded" },
        "service": state.config.service.name,
        "database": if db_ok { "connected" } else { "unreachable" },
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Replace sell_in_rivera from an uploaded CSV
#[utoipa::path(
    post,
    path = "/api/upload-sell-in-rivera",
    responses(
        (status = 200, description = "Table replaced", body = Value),
        (status = 400, description = "No file uploaded")
    ),
    tag = "reportsrv"
)]
pub async fn upload_sell_in_rivera(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let upload =
        TempUpload::from_multipart(&mut multipart, Path::new(&state.config.upload_dir)).await?;
    let rows = ingest::replace_from_csv::<RiveraTarget>(&state.pool, upload.path()).await?;

    Ok(Json(json!({ "message": "data replaced successfully", "rows": rows })))
}

/// Replace sell_in_cash from an uploaded CSV
#[utoipa::path(
    post,
    path = "/api/upload-sell-in-cash",
    responses(
        (status = 200, description = "Table replaced", body = Value),
        (status = 400, description = "No file uploaded")
    ),
    tag = "reportsrv"
)]
pub async fn upload_sell_in_cash(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let upload =
        TempUpload::from_multipart(&mut multipart, Path::new(&state.config.upload_dir)).await?;
    let rows = ingest::replace_from_csv::<CashTarget>(&state.pool, upload.path()).await?;

    Ok(Json(json!({ "message": "data replaced successfully", "rows": rows })))
}

/// Replace sell_in from an uploaded CSV (month names resolved to ordinals)
#[utoipa::path(
    post,
    path = "/api/upload-sell-in",
    responses(
        (status = 200, description = "Table replaced", body = Value),
        (status = 400, description = "No file uploaded")
    ),
    tag = "reportsrv"
)]
pub async fn upload_sell_in(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let upload =
        TempUpload::from_multipart(&mut multipart, Path::new(&state.config.upload_dir)).await?;
    let rows = ingest::replace_from_csv::<SellInTarget>(&state.pool, upload.path()).await?;

    Ok(Json(json!({ "message": "data replaced successfully", "rows": rows })))
}

/// List sell_in metrics ordered by year, month
#[utoipa::path(
    get,
    path = "/api/sell-in",
    responses((status = 200, description = "Metric rows", body = Value)),
    tag = "reportsrv"
)]
pub async fn get_sell_in(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let metrics = sell_in::list(&state.pool).await?;
    Ok(Json(json!(metrics)))
}

/// Merge-upsert one sell_in metric keyed by (year, month)
#[utoipa::path(
    put,
    path = "/api/sell-in",
    request_body = Value,
    responses(
        (status = 200, description = "Metric upserted", body = Value),
        (status = 400, description = "Missing required fields")
    ),
    tag = "reportsrv"
)]
pub async fn put_sell_in(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SellInUpdateRequest>,
) -> Result<Json<Value>> {
    let (year, month) = require_key(body.year, body.month)?;
    if body.value.is_none() && body.meta.is_none() {
        return Err(invalid_input("either value or meta is required"));
    }

    sell_in::upsert(&state.pool, year, month, body.value, body.meta).await?;

    info!(year, month, "sell_in upserted");
    Ok(Json(json!({ "message": "sell-in data updated successfully" })))
}

/// List sell_in_rivera order lines inside an inclusive date range
#[utoipa::path(
    get,
    path = "/api/sell-in-rivera",
    params(
        ("fechaInicial" = String, Query, description = "Range start, YYYY-MM-DD"),
        ("fechaFinal" = String, Query, description = "Range end, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Order lines", body = Value),
        (status = 400, description = "Missing or invalid dates")
    ),
    tag = "reportsrv"
)]
pub async fn get_sell_in_rivera(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateRangeQuery>,
) -> Result<Json<Value>> {
    let from = parse_date("fechaInicial", params.fecha_inicial.as_deref())?;
    let to = parse_date("fechaFinal", params.fecha_final.as_deref())?;

    let records = rivera::list_range(&state.pool, from, to).await?;
    Ok(Json(json!(records)))
}

/// List pedidos summaries ordered by year, month
#[utoipa::path(
    get,
    path = "/api/pedidos",
    responses((status = 200, description = "Summary rows", body = Value)),
    tag = "reportsrv"
)]
pub async fn get_pedidos(State(state): State<Arc<AppState>>) -> Result<Json<Value>> {
    let summaries = pedidos::list(&state.pool).await?;
    Ok(Json(json!(summaries)))
}

/// Merge-upsert one pedidos summary keyed by (year, month)
#[utoipa::path(
    put,
    path = "/api/pedidos",
    request_body = Value,
    responses(
        (status = 200, description = "Summary upserted", body = Value),
        (status = 400, description = "Missing year or month")
    ),
    tag = "reportsrv"
)]
pub async fn put_pedidos(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PedidosUpdateRequest>,
) -> Result<Json<Value>> {
    let (year, month) = require_key(body.year, body.month)?;

    let update = pedidos::OrdersUpdate {
        total_pedido: body.total_pedido,
        facturado: body.facturado,
        pendiente_cita: body.pendiente_cita,
        pendiente_sin_cita: body.pendiente_sin_cita,
    };
    pedidos::upsert(&state.pool, year, month, update).await?;

    info!(year, month, "pedidos upserted");
    Ok(Json(json!({ "message": "data updated successfully" })))
}

/// List or accumulate sell_in_cash figures
///
/// Three modes: no parameters lists everything ordered by year and month
/// ordinal; year+month lists that month; year+month+accumulate=true sums
/// the six figures over January through the requested month.
#[utoipa::path(
    get,
    path = "/api/sell-in-cash",
    params(
        ("year" = Option<i32>, Query, description = "Filter year"),
        ("month" = Option<String>, Query, description = "Spanish month name"),
        ("accumulate" = Option<String>, Query, description = "\"true\" for prefix totals")
    ),
    responses(
        (status = 200, description = "Rows or totals", body = Value),
        (status = 400, description = "Invalid month name")
    ),
    tag = "reportsrv"
)]
pub async fn get_sell_in_cash(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CashQuery>,
) -> Result<Json<Value>> {
    match (params.year, params.month.as_deref()) {
        (Some(year), Some(month_name)) if params.accumulate.as_deref() == Some("true") => {
            let month = Month::from_name(month_name)
                .ok_or_else(|| ReportSrvError::InvalidMonth(month_name.to_string()))?;
            let totals = cash_flow::accumulate(&state.pool, year, month).await?;
            Ok(Json(json!({ "totals": totals })))
        },
        (Some(year), Some(month_name)) => {
            let records = cash_flow::list_month(&state.pool, year, month_name).await?;
            Ok(Json(json!(records)))
        },
        _ => {
            let records = cash_flow::list_all(&state.pool).await?;
            Ok(Json(json!(records)))
        },
    }
}

/// Accumulated sell_in_cash totals for one year and month
#[utoipa::path(
    get,
    path = "/api/sell-in-cash-accumulated",
    params(
        ("year" = i32, Query, description = "Year"),
        ("month" = String, Query, description = "Spanish month name, any casing")
    ),
    responses(
        (status = 200, description = "Prefix totals", body = Value),
        (status = 400, description = "Missing or invalid month")
    ),
    tag = "reportsrv"
)]
pub async fn get_sell_in_cash_accumulated(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CashQuery>,
) -> Result<Json<Value>> {
    let year = params
        .year
        .ok_or_else(|| invalid_input("year and month are required"))?;
    let month_name = params
        .month
        .ok_or_else(|| invalid_input("year and month are required"))?;
    let month = Month::from_name(&month_name)
        .ok_or_else(|| ReportSrvError::InvalidMonth(month_name.clone()))?;

    let totals = cash_flow::accumulate(&state.pool, year, month).await?;
    Ok(Json(json!({ "totals": totals })))
}

/// Monthly purchased-pieces series for the fixed report years
#[utoipa::path(
    get,
    path = "/api/compra-piezas-by-year",
    responses((status = 200, description = "Twelve-slot series per year", body = Value)),
    tag = "reportsrv"
)]
pub async fn get_compra_piezas_by_year(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>> {
    // Independent year series, fetched concurrently
    let (data_2023, data_2024, data_2025) = tokio::try_join!(
        cash_flow::monthly_series(&state.pool, SERIES_YEARS[0]),
        cash_flow::monthly_series(&state.pool, SERIES_YEARS[1]),
        cash_flow::monthly_series(&state.pool, SERIES_YEARS[2]),
    )?;

    Ok(Json(json!({
        "months": Month::names(),
        "data2023": data_2023,
        "data2024": data_2024,
        "data2025": data_2025
    })))
}

/// Credential check against the usuarios table
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = Value,
    responses(
        (status = 200, description = "Role for the authenticated user", body = Value),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Unknown user or wrong password")
    ),
    tag = "reportsrv"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let username = body
        .username
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid_input("username and password are required"))?;
    let password = body
        .password
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| invalid_input("username and password are required"))?;

    // Unknown user and wrong password take the same path out
    let user = users::find_by_username(&state.pool, username)
        .await?
        .ok_or(ReportSrvError::AuthFailed)?;

    if !state.credentials.verify(password, &user.password) {
        return Err(ReportSrvError::AuthFailed);
    }

    info!(username, "login succeeded");
    Ok(Json(json!({ "message": "login successful", "role": user.role })))
}
