use std::net::SocketAddr;
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use vahan_core::models::{RecordField, RecordFilter, SalesRecord, SalesValue, VehicleClass};
use vahan_core::{Result, VahanError};
use vahan_runtime::{AggregationEngine, LocalStore, RecordStore};
use vahan_server::{build_router, AppState};

// ── Harness ───────────────────────────────────────────────────────────────────

async fn seeded_store() -> LocalStore {
    let store = LocalStore::in_memory();
    store
        .insert_many(
            VehicleClass::Ev,
            vec![
                SalesRecord::new("2023", "Kerala", "ATHER")
                    .with_month("JAN", "1,200")
                    .with_month("FEB", 300.0)
                    .with_month("MAR", SalesValue::Null),
                SalesRecord::new("2023", "Goa", "HONDA").with_month("JAN", 40.0),
                SalesRecord::new("2022", "Goa", "TATA MOTORS").with_month("Jan", 60.0),
            ],
        )
        .await
        .expect("seed ev");
    store
        .insert_many(
            VehicleClass::Ice,
            vec![
                SalesRecord::new("2023", "Goa", "TATA MOTORS").with_month("JAN", 500.0),
                SalesRecord::new("2023", "Delhi", "HONDA").with_month("FEB", 900.0),
            ],
        )
        .await
        .expect("seed ice");
    store
}

async fn spawn_app(store: Arc<dyn RecordStore>) -> SocketAddr {
    let app = build_router(AppState::new(AggregationEngine::new(store)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    addr
}

async fn spawn_seeded() -> SocketAddr {
    spawn_app(Arc::new(seeded_store().await)).await
}

async fn send_raw(addr: SocketAddr, method: &str, path: &str) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

async fn get_json(addr: SocketAddr, path: &str) -> (u16, Value) {
    let (status, _, body) = send_raw(addr, "GET", path).await;
    let json = serde_json::from_str(&body).expect("json body");
    (status, json)
}

// ── Catalogue ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_healthz() {
    let addr = spawn_seeded().await;
    let (status, body) = get_json(addr, "/healthz").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_catalogue_lists_are_sorted() {
    let addr = spawn_seeded().await;
    let (_, years) = get_json(addr, "/api/years").await;
    assert_eq!(years, serde_json::json!(["2022", "2023"]));
    let (_, states) = get_json(addr, "/api/states").await;
    assert_eq!(states, serde_json::json!(["Goa", "Kerala"]));
    let (_, makers) = get_json(addr, "/api/makers").await;
    assert_eq!(makers, serde_json::json!(["ATHER", "HONDA", "TATA MOTORS"]));
}

#[tokio::test]
async fn test_summary_counts() {
    let addr = spawn_seeded().await;
    let (status, body) = get_json(addr, "/api/summary").await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        serde_json::json!({
            "totalRecords": 3,
            "yearCount": 2,
            "stateCount": 2,
            "makerCount": 3
        })
    );
}

#[tokio::test]
async fn test_data_filters_and_limit() {
    let addr = spawn_seeded().await;
    let (_, all) = get_json(addr, "/api/data").await;
    assert_eq!(all.as_array().map(Vec::len), Some(3));

    let (_, limited) = get_json(addr, "/api/data?limit=1").await;
    assert_eq!(limited.as_array().map(Vec::len), Some(1));

    let (_, honda) = get_json(addr, "/api/data?maker=HONDA&year=").await;
    assert_eq!(honda.as_array().map(Vec::len), Some(1));
    assert_eq!(honda[0]["maker_name"], "HONDA");
    assert_eq!(honda[0]["monthly_data"]["JAN"], 40.0);
}

// ── Sales ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sales_ev_maker_totals() {
    let addr = spawn_seeded().await;
    let (status, body) = get_json(addr, "/api/sales/ev?year=2023").await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["_id"], "ATHER");
    assert_eq!(body[0]["maker"], "ATHER");
    assert_eq!(body[0]["totalSales"], 1500.0);
    assert_eq!(body[1]["_id"], "HONDA");
}

#[tokio::test]
async fn test_sales_monthly_ice_zero_fills() {
    let addr = spawn_seeded().await;
    let (_, body) = get_json(addr, "/api/sales/monthly?type=ice").await;
    let months = body.as_array().expect("array");
    assert_eq!(months.len(), 12);
    assert_eq!(months[0]["month"], "JAN");
    assert_eq!(months[0]["sales"], 500.0);
    assert_eq!(months[1]["sales"], 900.0);
    assert_eq!(months[11]["sales"], 0.0);
}

#[tokio::test]
async fn test_maker_monthly_requires_maker() {
    let addr = spawn_seeded().await;
    let (status, body) = get_json(addr, "/api/sales/maker-monthly?maker=").await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Maker parameter is required");
}

#[tokio::test]
async fn test_maker_monthly_series() {
    let addr = spawn_seeded().await;
    let (status, body) = get_json(addr, "/api/sales/maker-monthly?maker=HONDA&type=ice").await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().map(Vec::len), Some(12));
    assert_eq!(body[1]["month"], "February");
    assert_eq!(body[1]["shortMonth"], "FEB");
    assert_eq!(body[1]["sales"], 900.0);
}

#[tokio::test]
async fn test_bystate_electric_filter() {
    let addr = spawn_seeded().await;
    let (_, body) = get_json(addr, "/api/sales/bystate?type=ev").await;
    assert_eq!(body[0]["_id"], "Kerala");
    assert_eq!(body[0]["totalSales"], 1500.0);
    assert_eq!(body[1]["_id"], "Goa");
    assert_eq!(body[1]["totalSales"], 60.0);

    let (_, ice) = get_json(addr, "/api/sales/bystate?type=ice").await;
    assert_eq!(ice[0]["_id"], "Delhi");
    assert_eq!(ice[0]["totalSales"], 900.0);
}

#[tokio::test]
async fn test_compare_makers_requires_makers() {
    let addr = spawn_seeded().await;
    for path in [
        "/api/sales/compare-makers",
        "/api/sales/compare-makers-combined?makers=",
    ] {
        let (status, body) = get_json(addr, path).await;
        assert_eq!(status, 400, "{path}");
        assert_eq!(body["message"], "Makers parameter is required");
    }
}

#[tokio::test]
async fn test_compare_makers_keeps_unknown_maker() {
    let addr = spawn_seeded().await;
    let (_, body) = get_json(addr, "/api/sales/compare-makers?makers=ATHER,KIA").await;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[0]["maker"], "ATHER");
    assert_eq!(body[0]["totalSales"], 1500.0);
    assert_eq!(body[1]["maker"], "KIA");
    assert_eq!(body[1]["totalSales"], 0.0);
    assert_eq!(body[1]["monthlyData"].as_array().map(Vec::len), Some(12));
}

#[tokio::test]
async fn test_compare_makers_combined_totals() {
    let addr = spawn_seeded().await;
    let (status, body) = get_json(
        addr,
        "/api/sales/compare-makers-combined?makers=TATA%20MOTORS,HONDA&year=2023",
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body[0]["maker"], "TATA MOTORS");
    assert_eq!(body[0]["totalSales"]["ice"], 500.0);
    assert_eq!(body[0]["totalSales"]["total"], 500.0);
    let honda = &body[1];
    assert_eq!(honda["monthlyData"][0]["ev"], 40.0);
    assert_eq!(honda["monthlyData"][1]["ice"], 900.0);
    assert_eq!(honda["totalSales"]["total"], 940.0);
}

// ── Vehicles ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ev_analytics_shape() {
    let addr = spawn_seeded().await;
    let (status, body) = get_json(addr, "/api/vehicles/ev-analytics?year=2023").await;
    assert_eq!(status, 200);
    assert_eq!(body["totalSales"], 1540.0);
    assert_eq!(body["topSellers"][0]["maker"], "ATHER");
    assert_eq!(body["topSellers"][0]["model"], "Unknown");
    assert_eq!(body["monthlyData"][0]["month"], "Jan");
    assert_eq!(body["growth"], 0.0);
}

#[tokio::test]
async fn test_market_trends_shape() {
    let addr = spawn_seeded().await;
    let (_, body) = get_json(addr, "/api/vehicles/market-trends").await;
    assert_eq!(body["evShare"].as_array().map(Vec::len), Some(12));
    assert_eq!(body["iceShare"].as_array().map(Vec::len), Some(12));
    assert_eq!(body["comparisonData"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn test_comparison_default_makers() {
    let addr = spawn_seeded().await;
    let (_, body) = get_json(addr, "/api/vehicles/comparison").await;
    let makers: Vec<&str> = body
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|c| c["maker"].as_str())
        .collect();
    assert_eq!(makers, vec!["TATA MOTORS"]);
    assert_eq!(body[0]["totalSales"]["ice"], 500.0);
    assert_eq!(body[0]["monthlyData"][0]["month"], "JAN");
}

#[tokio::test]
async fn test_vehicle_sales_overview() {
    let addr = spawn_seeded().await;
    let (_, body) = get_json(addr, "/api/vehicles/sales?year=2023").await;
    assert_eq!(body["ev"]["totalSales"], 1540.0);
    assert_eq!(body["ice"]["totalSales"], 1400.0);
    assert_eq!(body["total"], 2940.0);
    assert_eq!(body["monthlyData"][0]["total"], 1740.0);
}

// ── Transport ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cors_preflight_and_headers() {
    let addr = spawn_seeded().await;
    let (status, head, _) = send_raw(addr, "OPTIONS", "/api/years").await;
    assert_eq!(status, 204);
    let head = head.to_ascii_lowercase();
    assert!(head.contains("access-control-allow-origin: *"));
    assert!(head.contains("access-control-allow-methods: get,options"));

    let (status, head, _) = send_raw(addr, "GET", "/api/years").await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("access-control-allow-origin: *"));
}

struct OfflineStore;

#[async_trait::async_trait]
impl RecordStore for OfflineStore {
    async fn distinct(&self, _: VehicleClass, _: RecordField) -> Result<Vec<String>> {
        Err(VahanError::Store("offline".into()))
    }
    async fn count(&self, _: VehicleClass) -> Result<usize> {
        Err(VahanError::Store("offline".into()))
    }
    async fn find(
        &self,
        _: VehicleClass,
        _: &RecordFilter,
        _: Option<usize>,
    ) -> Result<Vec<SalesRecord>> {
        Err(VahanError::Store("offline".into()))
    }
    async fn delete_many(&self, _: VehicleClass, _: &RecordFilter) -> Result<usize> {
        Err(VahanError::Store("offline".into()))
    }
    async fn insert_many(&self, _: VehicleClass, _: Vec<SalesRecord>) -> Result<usize> {
        Err(VahanError::Store("offline".into()))
    }
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let addr = spawn_app(Arc::new(OfflineStore)).await;
    for path in ["/api/summary", "/api/sales/ev", "/api/vehicles/sales"] {
        let (status, body) = get_json(addr, path).await;
        assert_eq!(status, 500, "{path}");
        assert_eq!(body, serde_json::json!({ "message": "Server error" }));
    }
}

#[tokio::test]
async fn test_missing_parameter_checked_before_store() {
    let addr = spawn_app(Arc::new(OfflineStore)).await;
    let (status, _) = get_json(addr, "/api/sales/compare-makers").await;
    assert_eq!(status, 400);
}
