//! JSON analytics API over the vehicle sales collections.
//!
//! Every route is a `GET` handler that turns query parameters into a
//! [`RecordFilter`](vahan_core::models::RecordFilter), asks the shared
//! [`AggregationEngine`] for the view and serializes it.

mod cors;
mod error;
mod handlers;
mod params;

use std::future::Future;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use vahan_runtime::AggregationEngine;

pub use error::ApiError;
pub use params::SalesQuery;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: AggregationEngine,
}

impl AppState {
    pub fn new(engine: AggregationEngine) -> Self {
        Self { engine }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/api/years", get(handlers::years))
        .route("/api/states", get(handlers::states))
        .route("/api/makers", get(handlers::makers))
        .route("/api/summary", get(handlers::summary))
        .route("/api/data", get(handlers::data))
        .route("/api/sales/ev", get(handlers::sales_ev))
        .route("/api/sales/ice", get(handlers::sales_ice))
        .route("/api/sales/monthly", get(handlers::sales_monthly))
        .route("/api/sales/maker-monthly", get(handlers::maker_monthly))
        .route("/api/sales/bystate", get(handlers::sales_by_state))
        .route("/api/sales/compare-makers", get(handlers::compare_makers))
        .route(
            "/api/sales/compare-makers-combined",
            get(handlers::compare_makers_combined),
        )
        .route("/api/vehicles/ev-analytics", get(handlers::ev_analytics))
        .route("/api/vehicles/ice-analytics", get(handlers::ice_analytics))
        .route("/api/vehicles/market-trends", get(handlers::market_trends))
        .route("/api/vehicles/comparison", get(handlers::comparison))
        .route("/api/vehicles/sales", get(handlers::sales_overview))
        .layer(from_fn(cors::cors_middleware))
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Server running");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
