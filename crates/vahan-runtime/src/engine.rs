//! Async aggregation engine.
//!
//! Owns the shared [`RecordStore`] handle, fetches the records each query
//! needs (both classes concurrently where a view spans them) and hands them
//! to the pure folds in `vahan-data`.

use std::sync::Arc;

use chrono::Datelike;
use serde::Serialize;
use vahan_core::models::{RecordField, RecordFilter, SalesRecord, VehicleClass};
use vahan_core::Result;
use vahan_data::aggregator::{
    CombinedMakerComparison, MakerComparison, MakerMonthSales, MakerTotal, MonthlySales,
    SalesAggregator, StateTotal,
};
use vahan_data::analysis::{
    ClassAnalytics, DashboardComparison, MarketTrends, SalesAnalysis, SalesOverview,
};

use crate::store::RecordStore;

/// Record count used by `/api/data` when no limit is given.
pub const DEFAULT_RECORD_LIMIT: usize = 1000;

/// Record and distinct-value counts of the unified collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_records: usize,
    pub year_count: usize,
    pub state_count: usize,
    pub maker_count: usize,
}

// ── AggregationEngine ─────────────────────────────────────────────────────────

/// Query layer shared by every request handler.
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn RecordStore>,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    // ── Fetching ──────────────────────────────────────────────────────────

    async fn fetch(&self, class: VehicleClass, filter: &RecordFilter) -> Result<Vec<SalesRecord>> {
        let records = self.store.find(class, filter, None).await?;
        tracing::debug!(
            collection = class.collection_name(),
            records = records.len(),
            "fetched records"
        );
        Ok(records)
    }

    /// EV and ICE records matching `filter`, fetched concurrently.
    async fn fetch_both(
        &self,
        filter: &RecordFilter,
    ) -> Result<(Vec<SalesRecord>, Vec<SalesRecord>)> {
        tokio::try_join!(
            self.fetch(VehicleClass::Ev, filter),
            self.fetch(VehicleClass::Ice, filter)
        )
    }

    // ── Catalogue ─────────────────────────────────────────────────────────

    /// Sorted distinct values of `field` over the unified collection.
    pub async fn distinct_values(&self, field: RecordField) -> Result<Vec<String>> {
        let mut values = self.store.distinct(VehicleClass::Ev, field).await?;
        values.sort();
        tracing::debug!(field = field.as_str(), values = values.len(), "distinct values");
        Ok(values)
    }

    pub async fn summary(&self) -> Result<Summary> {
        let class = VehicleClass::Ev;
        let (total_records, years, states, makers) = tokio::try_join!(
            self.store.count(class),
            self.store.distinct(class, RecordField::Year),
            self.store.distinct(class, RecordField::State),
            self.store.distinct(class, RecordField::MakerName),
        )?;
        Ok(Summary {
            total_records,
            year_count: years.len(),
            state_count: states.len(),
            maker_count: makers.len(),
        })
    }

    /// Raw records of the unified collection; a `limit` of 0 means unlimited.
    pub async fn records(&self, filter: &RecordFilter, limit: usize) -> Result<Vec<SalesRecord>> {
        let limit = (limit > 0).then_some(limit);
        self.store.find(VehicleClass::Ev, filter, limit).await
    }

    // ── Single-class folds ────────────────────────────────────────────────

    pub async fn maker_totals(
        &self,
        class: VehicleClass,
        filter: &RecordFilter,
    ) -> Result<Vec<MakerTotal>> {
        let records = self.fetch(class, filter).await?;
        Ok(SalesAggregator::maker_totals(&records))
    }

    pub async fn monthly_totals(
        &self,
        class: VehicleClass,
        filter: &RecordFilter,
    ) -> Result<Vec<MonthlySales>> {
        let records = self.fetch(class, filter).await?;
        Ok(SalesAggregator::monthly_totals(&records))
    }

    /// Twelve-month series of one maker; all zeros when it has no records.
    pub async fn maker_monthly(
        &self,
        class: VehicleClass,
        maker: &str,
        filter: RecordFilter,
    ) -> Result<Vec<MakerMonthSales>> {
        let records = self.fetch(class, &filter.with_maker(maker)).await?;
        Ok(SalesAggregator::maker_monthly(&records))
    }

    /// Per-state totals; `filter.electric_only` narrows the unified
    /// collection to electric records.
    pub async fn state_totals(
        &self,
        class: VehicleClass,
        filter: &RecordFilter,
    ) -> Result<Vec<StateTotal>> {
        let records = self.fetch(class, filter).await?;
        Ok(SalesAggregator::state_totals(&records))
    }

    pub async fn compare_makers(
        &self,
        class: VehicleClass,
        makers: &[String],
        filter: RecordFilter,
    ) -> Result<Vec<MakerComparison>> {
        let records = self
            .fetch(class, &filter.with_makers(makers.to_vec()))
            .await?;
        Ok(SalesAggregator::compare_makers(&records, makers))
    }

    // ── Cross-class views ─────────────────────────────────────────────────

    pub async fn compare_makers_combined(
        &self,
        makers: &[String],
        filter: RecordFilter,
    ) -> Result<Vec<CombinedMakerComparison>> {
        let (ev, ice) = self
            .fetch_both(&filter.with_makers(makers.to_vec()))
            .await?;
        Ok(SalesAggregator::compare_makers_combined(&ev, &ice, makers))
    }

    pub async fn class_analytics(
        &self,
        class: VehicleClass,
        filter: &RecordFilter,
    ) -> Result<ClassAnalytics> {
        let records = self.fetch(class, filter).await?;
        Ok(SalesAnalysis::class_analytics(&records))
    }

    pub async fn market_trends(&self, filter: &RecordFilter) -> Result<MarketTrends> {
        let (ev, ice) = self.fetch_both(filter).await?;
        let current_year = chrono::Local::now().year();
        Ok(SalesAnalysis::market_trends(&ev, &ice, current_year))
    }

    /// Maker comparison panel; `makers` of `None` selects the default set.
    pub async fn dashboard_comparison(
        &self,
        makers: Option<Vec<String>>,
        filter: RecordFilter,
    ) -> Result<Vec<DashboardComparison>> {
        let makers = SalesAnalysis::comparison_makers(makers);
        let (ev, ice) = self
            .fetch_both(&filter.with_makers(makers.clone()))
            .await?;
        Ok(SalesAnalysis::dashboard_comparison(&ev, &ice, &makers))
    }

    pub async fn sales_overview(&self, filter: &RecordFilter) -> Result<SalesOverview> {
        let (ev, ice) = self.fetch_both(filter).await?;
        Ok(SalesAnalysis::sales_overview(&ev, &ice))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
