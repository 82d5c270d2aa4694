//! End-to-end API tests against an in-memory database

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use reportsrv::app_state::AppState;
use reportsrv::config::Config;
use reportsrv::{db, routes};
use serde_json::{json, Value};
use sqlx::any::AnyPoolOptions;
use std::sync::Arc;
use tower::util::ServiceExt;

const BOUNDARY: &str = "reportsrv-test-boundary";

async fn build_app() -> (Router, Arc<AppState>) {
    sqlx::any::install_default_drivers();

    // One connection: each in-memory SQLite connection is a separate db
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_schema(&pool).await.unwrap();

    let mut config = Config::default();
    config.upload_dir = std::env::temp_dir()
        .join(format!("reportsrv-it-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let state = Arc::new(AppState::with_pool(pool, config));
    (routes::create_routes(state.clone()), state)
}

fn multipart_upload(uri: &str, csv: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\n\
         content-disposition: form-data; name=\"file\"; filename=\"data.csv\"\r\n\
         content-type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{b}--\r\n",
        b = BOUNDARY,
        csv = csv
    );
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1_000_000).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const CASH_HEADER: &str =
    "Ano,Mes,Clave,Descripcion,CompraCaja,VentaCaja,CompraMXN,VentaMXN,CompraPiezas,VentaPiezas";

#[tokio::test]
async fn test_cash_upload_then_month_query() {
    let (app, _state) = build_app().await;

    let csv = format!("{}\n2024,Marzo,ABC,Widget,10,8,1000,800,100,80", CASH_HEADER);
    let resp = app
        .clone()
        .oneshot(multipart_upload("/api/upload-sell-in-cash", &csv))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(get("/api/sell-in-cash?year=2024&month=Marzo"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rows = body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Ano"], 2024);
    assert_eq!(rows[0]["Mes"], "Marzo");
    assert_eq!(rows[0]["Clave"], "ABC");
    assert_eq!(rows[0]["Descripcion"], "Widget");
    assert_eq!(rows[0]["CompraMXN"], 1000.0);
    assert_eq!(rows[0]["VentaPiezas"], 80.0);
}

#[tokio::test]
async fn test_full_replace_keeps_only_second_file() {
    let (app, state) = build_app().await;

    let first = format!(
        "{}\n2023,Enero,AAA,First,1,1,1,1,1,1\n2023,Febrero,BBB,First,2,2,2,2,2,2",
        CASH_HEADER
    );
    let resp = app
        .clone()
        .oneshot(multipart_upload("/api/upload-sell-in-cash", &first))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let second = format!("{}\n2024,Marzo,CCC,Second,3,3,3,3,3,3", CASH_HEADER);
    let resp = app
        .clone()
        .oneshot(multipart_upload("/api/upload-sell-in-cash", &second))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get("/api/sell-in-cash")).await.unwrap();
    let rows = body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["Clave"], "CCC");

    // Upload dir left clean on the success path
    let leftover = std::fs::read_dir(&state.config.upload_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftover, 0);
}

#[tokio::test]
async fn test_accumulate_sums_january_through_requested_month() {
    let (app, _state) = build_app().await;

    let csv = format!(
        "{}\n\
         2024,Enero,A,W,1,1,10,20,1,1\n\
         2024,Marzo,B,W,1,1,30,40,1,1\n\
         2024,Junio,C,W,1,1,50,60,1,1\n\
         2024,Julio,D,W,1,1,700,800,1,1\n\
         2023,Mayo,E,W,1,1,9000,9000,1,1",
        CASH_HEADER
    );
    let resp = app
        .clone()
        .oneshot(multipart_upload("/api/upload-sell-in-cash", &csv))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Enero..Junio of 2024: Julio and the other year stay out
    let resp = app
        .clone()
        .oneshot(get("/api/sell-in-cash?year=2024&month=Junio&accumulate=true"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["totals"]["totalCompraMXN"], 90.0);
    assert_eq!(body["totals"]["totalVentaMXN"], 120.0);

    // The dedicated accumulated endpoint matches, with sloppy casing
    let resp = app
        .oneshot(get("/api/sell-in-cash-accumulated?year=2024&month=%20JUNIO%20"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["totals"]["totalCompraMXN"], 90.0);
    assert_eq!(body["totals"]["totalVentaMXN"], 120.0);
}

#[tokio::test]
async fn test_sell_in_upload_maps_months_and_drops_unknown() {
    let (app, _state) = build_app().await;

    let csv = format!(
        "{}\n\
         2024,Enero,A,W,1,1,1,1,100,80\n\
         2024,Invierno,B,W,1,1,1,1,999,999",
        CASH_HEADER
    );
    let resp = app
        .clone()
        .oneshot(multipart_upload("/api/upload-sell-in", &csv))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["rows"], 1);

    let resp = app.oneshot(get("/api/sell-in")).await.unwrap();
    let rows = body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["year"], 2024);
    assert_eq!(rows[0]["month"], 1);
    assert_eq!(rows[0]["value"], 100.0);
    assert_eq!(rows[0]["meta"], 80.0);
}

#[tokio::test]
async fn test_rivera_range_is_inclusive_and_ordered() {
    let (app, _state) = build_app().await;

    let csv = "Folio,Fecha Ord.,Suc,Nombre,Clave,Producto,Presentacion,\
               Cant. Ord.,Cant. Pend.,Cant. Surt.,Fill Rate,Sell In Pzas,Pedido SAP,Estatus\n\
               F-20,15/03/2024,S1,Cliente,AAA,Widget,Caja,10,0,10,100%,10,SAP-1,Surtido\n\
               F-10,15/03/2024,S1,Cliente,BBB,Widget,Caja,10,0,10,100%,10,SAP-2,Surtido\n\
               F-30,01/03/2024,S2,Cliente,CCC,Widget,Caja,5,5,0,0%,0,,\n\
               F-40,20/04/2024,S2,Cliente,DDD,Widget,Caja,5,5,0,0%,0,,";
    let resp = app
        .clone()
        .oneshot(multipart_upload("/api/upload-sell-in-rivera", csv))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Range boundaries are inclusive; F-40 falls outside
    let resp = app
        .oneshot(get("/api/sell-in-rivera?fechaInicial=2024-03-01&fechaFinal=2024-03-15"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rows = body_json(resp).await;
    let folios: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Folio"].as_str().unwrap())
        .collect();
    // Date ascending, folio breaking the tie
    assert_eq!(folios, vec!["F-30", "F-10", "F-20"]);
}

#[tokio::test]
async fn test_sell_in_rivera_replace_is_idempotent() {
    let (app, _state) = build_app().await;

    let header = "Folio,Fecha Ord.,Suc,Nombre,Clave,Producto,Presentacion,\
                  Cant. Ord.,Cant. Pend.,Cant. Surt.,Fill Rate,Sell In Pzas,Pedido SAP,Estatus";
    let file_a = format!("{}\nA-1,01/01/2024,S1,C,K,P,Pres,1,0,1,100%,1,,", header);
    let file_b = format!(
        "{}\nB-1,02/01/2024,S1,C,K,P,Pres,1,0,1,100%,1,,\nB-2,03/01/2024,S1,C,K,P,Pres,1,0,1,100%,1,,",
        header
    );

    for file in [&file_a, &file_b] {
        let resp = app
            .clone()
            .oneshot(multipart_upload("/api/upload-sell-in-rivera", file))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .oneshot(get("/api/sell-in-rivera?fechaInicial=2024-01-01&fechaFinal=2024-12-31"))
        .await
        .unwrap();
    let rows = body_json(resp).await;
    let folios: Vec<&str> = rows
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Folio"].as_str().unwrap())
        .collect();
    assert_eq!(folios, vec!["B-1", "B-2"]);
}

#[tokio::test]
async fn test_sell_in_upload_replaces_previous_contents() {
    let (app, _state) = build_app().await;

    let first = format!("{}\n2024,Enero,A,W,1,1,1,1,10,10", CASH_HEADER);
    let second = format!("{}\n2025,Febrero,B,W,1,1,1,1,20,20", CASH_HEADER);

    for csv in [&first, &second] {
        let resp = app
            .clone()
            .oneshot(multipart_upload("/api/upload-sell-in", csv))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app.oneshot(get("/api/sell-in")).await.unwrap();
    let rows = body_json(resp).await;
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["year"], 2025);
    assert_eq!(rows[0]["month"], 2);
}

#[tokio::test]
async fn test_compra_piezas_dedupes_across_month_spellings() {
    let (app, _state) = build_app().await;

    let csv = format!(
        "{}\n\
         2024,Enero,A,W,1,1,1,1,100,1\n\
         2024,enero,B,W,1,1,1,1,100,1\n\
         2024, ENERO ,C,W,1,1,1,1,40,1",
        CASH_HEADER
    );
    let resp = app
        .clone()
        .oneshot(multipart_upload("/api/upload-sell-in-cash", &csv))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get("/api/compra-piezas-by-year")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    // The repeated 100 counts once no matter how the month is spelled
    assert_eq!(body["data2024"].as_array().unwrap()[0], 140.0);
}

#[tokio::test]
async fn test_compra_piezas_by_year_fills_series() {
    let (app, _state) = build_app().await;

    let csv = format!(
        "{}\n\
         2024,Enero,A,W,1,1,1,1,100,1\n\
         2024,Enero,B,W,1,1,1,1,50,1\n\
         2024,Abril,C,W,1,1,1,1,30,1\n\
         2023,Diciembre,D,W,1,1,1,1,7,1",
        CASH_HEADER
    );
    let resp = app
        .clone()
        .oneshot(multipart_upload("/api/upload-sell-in-cash", &csv))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.oneshot(get("/api/compra-piezas-by-year")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    let data_2024 = body["data2024"].as_array().unwrap();
    assert_eq!(data_2024[0], 150.0); // Enero: distinct 100 + 50
    assert_eq!(data_2024[1], 0.0);
    assert_eq!(data_2024[3], 30.0);
    assert_eq!(body["data2023"].as_array().unwrap()[11], 7.0);
    assert_eq!(
        body["data2025"],
        json!([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])
    );
}
