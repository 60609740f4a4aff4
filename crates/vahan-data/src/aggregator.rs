//! Folds over sales record sets.
//!
//! Every function here is pure: the caller fetches and filters the records,
//! these functions only reduce them. Output types serialize to the JSON
//! shapes served by the API.

use std::collections::HashMap;

use serde::Serialize;
use vahan_core::data_processors::SalesCoercion;
use vahan_core::models::{MonthCode, MonthKeyMatch, SalesRecord};

/// Twelve monthly buckets in calendar order.
pub type MonthlySeries = [f64; 12];

// ── Output shapes ─────────────────────────────────────────────────────────────

/// Sales summed per maker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakerTotal {
    #[serde(rename = "_id")]
    pub id: String,
    pub total_sales: f64,
    pub maker: String,
}

/// Sales summed per state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTotal {
    #[serde(rename = "_id")]
    pub id: String,
    pub total_sales: f64,
}

/// One bucket keyed by its month code or label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub month: String,
    pub sales: f64,
}

/// One bucket of a single maker's series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakerMonthSales {
    /// Full month name.
    pub month: String,
    /// Month code.
    pub short_month: String,
    pub sales: f64,
}

/// A maker's total and monthly breakdown within one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MakerComparison {
    pub maker: String,
    pub total_sales: f64,
    pub monthly_data: Vec<MonthlySales>,
}

/// EV, ICE and their sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassSplit {
    pub ev: f64,
    pub ice: f64,
    pub total: f64,
}

impl ClassSplit {
    pub fn new(ev: f64, ice: f64) -> Self {
        Self {
            ev,
            ice,
            total: ev + ice,
        }
    }
}

/// One month of a cross-class series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedMonth {
    pub month: String,
    pub ev: f64,
    pub ice: f64,
    pub total: f64,
}

impl CombinedMonth {
    fn new(month: impl Into<String>, split: ClassSplit) -> Self {
        Self {
            month: month.into(),
            ev: split.ev,
            ice: split.ice,
            total: split.total,
        }
    }
}

/// A maker's sales across both classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedMakerComparison {
    pub maker: String,
    pub total_sales: ClassSplit,
    pub monthly_data: Vec<CombinedMonth>,
}

// ── SalesAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that reduces record sets.
pub struct SalesAggregator;

impl SalesAggregator {
    /// Sum of every monthly value of `record`, whatever its key.
    pub fn record_total(record: &SalesRecord) -> f64 {
        SalesCoercion::sum_all(record.monthly_data.values())
    }

    /// Fold `records` into twelve buckets; keys that `mode` does not resolve
    /// to a month code are ignored.
    pub fn monthly_series<'a>(
        records: impl IntoIterator<Item = &'a SalesRecord>,
        mode: MonthKeyMatch,
    ) -> MonthlySeries {
        let mut series = [0.0; 12];
        for record in records {
            for (key, value) in &record.monthly_data {
                if let Some(month) = mode.resolve(key) {
                    series[month.index()] += SalesCoercion::coerce(value);
                }
            }
        }
        series
    }

    /// Per-maker totals over all monthly values, highest first.
    pub fn maker_totals(records: &[SalesRecord]) -> Vec<MakerTotal> {
        Self::grouped_totals(records, |r| &r.maker_name)
            .into_iter()
            .map(|(maker, total_sales)| MakerTotal {
                id: maker.clone(),
                total_sales,
                maker,
            })
            .collect()
    }

    /// Per-state totals over all monthly values, highest first.
    pub fn state_totals(records: &[SalesRecord]) -> Vec<StateTotal> {
        Self::grouped_totals(records, |r| &r.state)
            .into_iter()
            .map(|(state, total_sales)| StateTotal {
                id: state,
                total_sales,
            })
            .collect()
    }

    /// Twelve zero-filled buckets keyed by month code.
    ///
    /// Stored keys are uppercased before matching, so `"Jan"` counts.
    pub fn monthly_totals(records: &[SalesRecord]) -> Vec<MonthlySales> {
        let series = Self::monthly_series(records, MonthKeyMatch::Uppercased);
        MonthCode::ALL
            .iter()
            .map(|m| MonthlySales {
                month: m.code().to_string(),
                sales: series[m.index()],
            })
            .collect()
    }

    /// One maker's series; `records` must already be scoped to that maker.
    ///
    /// Stored keys must equal a month code exactly.
    pub fn maker_monthly(records: &[SalesRecord]) -> Vec<MakerMonthSales> {
        let series = Self::monthly_series(records, MonthKeyMatch::Exact);
        MonthCode::ALL
            .iter()
            .map(|m| MakerMonthSales {
                month: m.full_label().to_string(),
                short_month: m.code().to_string(),
                sales: series[m.index()],
            })
            .collect()
    }

    /// Series for each requested maker, in request order with duplicates
    /// removed. Makers without records get a zero series.
    pub fn series_by_maker<'a>(
        records: &[SalesRecord],
        makers: &'a [String],
    ) -> Vec<(&'a str, MonthlySeries)> {
        let requested = unique_makers(makers);
        let mut series: Vec<MonthlySeries> = vec![[0.0; 12]; requested.len()];
        let slots: HashMap<&str, usize> = requested
            .iter()
            .enumerate()
            .map(|(slot, maker)| (*maker, slot))
            .collect();

        for record in records {
            let Some(&slot) = slots.get(record.maker_name.as_str()) else {
                continue;
            };
            let folded = Self::monthly_series([record], MonthKeyMatch::Exact);
            for (bucket, value) in series[slot].iter_mut().zip(folded) {
                *bucket += value;
            }
        }

        requested.into_iter().zip(series).collect()
    }

    /// Total and monthly breakdown for every requested maker of one class.
    ///
    /// A maker with no records is reported with zeros, never dropped.
    pub fn compare_makers(records: &[SalesRecord], makers: &[String]) -> Vec<MakerComparison> {
        Self::series_by_maker(records, makers)
            .into_iter()
            .map(|(maker, series)| MakerComparison {
                maker: maker.to_string(),
                total_sales: series.iter().sum(),
                monthly_data: MonthCode::ALL
                    .iter()
                    .map(|m| MonthlySales {
                        month: m.code().to_string(),
                        sales: series[m.index()],
                    })
                    .collect(),
            })
            .collect()
    }

    /// Per-maker EV/ICE comparison from independent folds of each class.
    pub fn compare_makers_combined(
        ev: &[SalesRecord],
        ice: &[SalesRecord],
        makers: &[String],
    ) -> Vec<CombinedMakerComparison> {
        let ev_series = Self::series_by_maker(ev, makers);
        let ice_series = Self::series_by_maker(ice, makers);

        ev_series
            .into_iter()
            .zip(ice_series)
            .map(|((maker, ev_months), (_, ice_months))| CombinedMakerComparison {
                maker: maker.to_string(),
                total_sales: ClassSplit::new(ev_months.iter().sum(), ice_months.iter().sum()),
                monthly_data: MonthCode::ALL
                    .iter()
                    .map(|m| {
                        CombinedMonth::new(
                            m.code(),
                            ClassSplit::new(ev_months[m.index()], ice_months[m.index()]),
                        )
                    })
                    .collect(),
            })
            .collect()
    }

    /// Sum record totals per key, first-seen order, then sort descending.
    fn grouped_totals<F>(records: &[SalesRecord], key: F) -> Vec<(String, f64)>
    where
        F: Fn(&SalesRecord) -> &String,
    {
        let mut totals: Vec<(String, f64)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let name = key(record);
            let slot = *slots.entry(name.as_str()).or_insert_with(|| {
                totals.push((name.clone(), 0.0));
                totals.len() - 1
            });
            totals[slot].1 += Self::record_total(record);
        }

        totals.sort_by(|a, b| b.1.total_cmp(&a.1));
        totals
    }
}

/// Request order with later duplicates removed.
pub fn unique_makers(makers: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    makers
        .iter()
        .map(String::as_str)
        .filter(|maker| seen.insert(*maker))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
