use axum::extract::{Query, State};
use axum::Json;
use serde_json::{json, Value};
use vahan_core::models::{RecordField, SalesRecord, VehicleClass};
use vahan_data::aggregator::{
    CombinedMakerComparison, MakerComparison, MakerMonthSales, MakerTotal, MonthlySales,
    StateTotal,
};
use vahan_data::analysis::{ClassAnalytics, DashboardComparison, MarketTrends, SalesOverview};
use vahan_runtime::engine::Summary;

use crate::error::ApiError;
use crate::params::SalesQuery;
use crate::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;

fn respond<T>(operation: &'static str, result: vahan_core::Result<T>) -> ApiResult<T> {
    result
        .map(Json)
        .map_err(|err| ApiError::from_error(operation, err))
}

pub(crate) async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ── Catalogue ─────────────────────────────────────────────────────────────────

pub(crate) async fn years(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    respond("years", state.engine.distinct_values(RecordField::Year).await)
}

pub(crate) async fn states(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    respond("states", state.engine.distinct_values(RecordField::State).await)
}

pub(crate) async fn makers(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    respond("makers", state.engine.distinct_values(RecordField::MakerName).await)
}

pub(crate) async fn summary(State(state): State<AppState>) -> ApiResult<Summary> {
    respond("summary", state.engine.summary().await)
}

pub(crate) async fn data(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<SalesRecord>> {
    let mut filter = query.year_state_filter();
    if let Some(maker) = &query.maker {
        filter = filter.with_maker(maker.clone());
    }
    respond(
        "data",
        state.engine.records(&filter, query.record_limit()).await,
    )
}

// ── Sales ─────────────────────────────────────────────────────────────────────

pub(crate) async fn sales_ev(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<MakerTotal>> {
    let filter = query.year_state_filter();
    respond(
        "sales-ev",
        state.engine.maker_totals(VehicleClass::Ev, &filter).await,
    )
}

pub(crate) async fn sales_ice(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<MakerTotal>> {
    let filter = query.year_state_filter();
    respond(
        "sales-ice",
        state.engine.maker_totals(VehicleClass::Ice, &filter).await,
    )
}

pub(crate) async fn sales_monthly(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<MonthlySales>> {
    let filter = query.year_state_filter();
    respond(
        "sales-monthly",
        state.engine.monthly_totals(query.class(), &filter).await,
    )
}

pub(crate) async fn maker_monthly(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<MakerMonthSales>> {
    const OPERATION: &str = "maker-monthly";
    let maker = query
        .required_maker()
        .map_err(|err| ApiError::from_error(OPERATION, err))?;
    respond(
        OPERATION,
        state
            .engine
            .maker_monthly(query.class(), maker, query.year_state_filter())
            .await,
    )
}

/// State totals take no `state` filter.
pub(crate) async fn sales_by_state(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<StateTotal>> {
    let mut filter = query.year_filter();
    let class = query.class();
    if class == VehicleClass::Ev && query.wants_electric_only() {
        filter = filter.electric_only();
    }
    respond("sales-bystate", state.engine.state_totals(class, &filter).await)
}

pub(crate) async fn compare_makers(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<MakerComparison>> {
    const OPERATION: &str = "compare-makers";
    let makers = query
        .required_makers()
        .map_err(|err| ApiError::from_error(OPERATION, err))?;
    respond(
        OPERATION,
        state
            .engine
            .compare_makers(query.class(), &makers, query.year_state_filter())
            .await,
    )
}

pub(crate) async fn compare_makers_combined(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<CombinedMakerComparison>> {
    const OPERATION: &str = "compare-makers-combined";
    let makers = query
        .required_makers()
        .map_err(|err| ApiError::from_error(OPERATION, err))?;
    respond(
        OPERATION,
        state
            .engine
            .compare_makers_combined(&makers, query.year_state_filter())
            .await,
    )
}

// ── Vehicles ──────────────────────────────────────────────────────────────────

pub(crate) async fn ev_analytics(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<ClassAnalytics> {
    let filter = query.year_filter();
    respond(
        "ev-analytics",
        state.engine.class_analytics(VehicleClass::Ev, &filter).await,
    )
}

pub(crate) async fn ice_analytics(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<ClassAnalytics> {
    let filter = query.year_filter();
    respond(
        "ice-analytics",
        state.engine.class_analytics(VehicleClass::Ice, &filter).await,
    )
}

pub(crate) async fn market_trends(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<MarketTrends> {
    let filter = query.year_filter();
    respond("market-trends", state.engine.market_trends(&filter).await)
}

pub(crate) async fn comparison(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<Vec<DashboardComparison>> {
    respond(
        "comparison",
        state
            .engine
            .dashboard_comparison(query.maker_list(), query.year_filter())
            .await,
    )
}

pub(crate) async fn sales_overview(
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> ApiResult<SalesOverview> {
    let filter = query.year_filter();
    respond("vehicle-sales", state.engine.sales_overview(&filter).await)
}
