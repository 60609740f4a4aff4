//! Dashboard analytics built on top of [`SalesAggregator`].
//!
//! Covers the per-class analytics cards, EV/ICE market share, the maker
//! comparison panel and the combined sales overview.

use std::collections::HashMap;

use serde::Serialize;
use vahan_core::calculations::{round_one_decimal, GrowthCalculator};
use vahan_core::models::{MonthCode, MonthKeyMatch, SalesRecord};

use crate::aggregator::{unique_makers, CombinedMonth, MonthlySales, SalesAggregator};

/// Makers shown by the comparison panel when the caller names none.
pub const DEFAULT_COMPARISON_MAKERS: &[&str] = &["TATA MOTORS", "MARUTI SUZUKI", "HYUNDAI"];

/// Number of entries in the top-seller ranking.
pub const TOP_SELLER_LIMIT: usize = 5;

/// Years covered by the market-trend comparison series.
pub const TREND_YEARS: i32 = 5;

// ── Output shapes ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopSeller {
    pub maker: String,
    pub model: String,
    pub sales: f64,
}

/// Analytics card for one vehicle class.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassAnalytics {
    pub top_sellers: Vec<TopSeller>,
    /// Buckets labelled `Jan..Dec`.
    pub monthly_data: Vec<MonthlySales>,
    pub total_sales: f64,
    /// December over November, percent.
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthShare {
    pub month: String,
    pub share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearShare {
    pub year: String,
    pub ev: f64,
    pub ice: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrends {
    pub ev_share: Vec<MonthShare>,
    pub ice_share: Vec<MonthShare>,
    /// Synthetic placeholder series, see [`SalesAnalysis::synthetic_year_comparison`].
    pub comparison_data: Vec<YearShare>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvIceTotals {
    pub ev: f64,
    pub ice: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvIceMonth {
    pub month: String,
    pub ev: f64,
    pub ice: f64,
}

/// One maker of the comparison panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardComparison {
    pub maker: String,
    pub total_sales: EvIceTotals,
    pub monthly_data: Vec<EvIceMonth>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSales {
    pub total_sales: f64,
    pub monthly_data: Vec<MonthlySales>,
}

/// Combined EV and ICE sales for the overview chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOverview {
    pub ev: ClassSales,
    pub ice: ClassSales,
    pub total: f64,
    /// Second half of the year over the first, percent.
    pub growth: f64,
    pub monthly_data: Vec<CombinedMonth>,
}

// ── SalesAnalysis ─────────────────────────────────────────────────────────────

/// Stateless analytics over one or both record classes.
///
/// All monthly folds here match stored keys exactly.
pub struct SalesAnalysis;

impl SalesAnalysis {
    /// Top sellers, `Jan..Dec` totals, overall total and month-over-month
    /// growth for one class.
    pub fn class_analytics(records: &[SalesRecord]) -> ClassAnalytics {
        let series = SalesAggregator::monthly_series(records, MonthKeyMatch::Exact);

        ClassAnalytics {
            top_sellers: Self::top_sellers(records, TOP_SELLER_LIMIT),
            monthly_data: labelled_series(&series),
            total_sales: series.iter().sum(),
            growth: GrowthCalculator::trailing_growth(&series),
        }
    }

    /// Rank `(maker, model)` pairs by summed sales over every monthly value.
    pub fn top_sellers(records: &[SalesRecord], limit: usize) -> Vec<TopSeller> {
        let mut sellers: Vec<TopSeller> = Vec::new();
        let mut slots: HashMap<(&str, &str), usize> = HashMap::new();

        for record in records {
            let key = (record.maker_name.as_str(), record.model_name());
            let slot = *slots.entry(key).or_insert_with(|| {
                sellers.push(TopSeller {
                    maker: key.0.to_string(),
                    model: key.1.to_string(),
                    sales: 0.0,
                });
                sellers.len() - 1
            });
            sellers[slot].sales += SalesAggregator::record_total(record);
        }

        sellers.sort_by(|a, b| b.sales.total_cmp(&a.sales));
        sellers.truncate(limit);
        sellers
    }

    /// Monthly EV/ICE market share plus the yearly comparison series.
    pub fn market_trends(
        ev: &[SalesRecord],
        ice: &[SalesRecord],
        current_year: i32,
    ) -> MarketTrends {
        let ev_series = SalesAggregator::monthly_series(ev, MonthKeyMatch::Exact);
        let ice_series = SalesAggregator::monthly_series(ice, MonthKeyMatch::Exact);

        let (ev_share, ice_share) = MonthCode::ALL
            .iter()
            .map(|m| {
                let (ev_sales, ice_sales) = (ev_series[m.index()], ice_series[m.index()]);
                let combined = ev_sales + ice_sales;
                let month = m.short_label().to_string();
                (
                    MonthShare {
                        month: month.clone(),
                        share: GrowthCalculator::share_percent(ev_sales, combined),
                    },
                    MonthShare {
                        month,
                        share: GrowthCalculator::share_percent(ice_sales, combined),
                    },
                )
            })
            .unzip();

        MarketTrends {
            ev_share,
            ice_share,
            comparison_data: Self::synthetic_year_comparison(current_year),
        }
    }

    /// Placeholder five-year EV/ICE share series, oldest year first.
    ///
    /// This is synthetic data, not derived from stored records: the EV share
    /// for the year `i` years back is `2 + 0.7 * i` and ICE takes the rest.
    pub fn synthetic_year_comparison(current_year: i32) -> Vec<YearShare> {
        (0..TREND_YEARS)
            .rev()
            .map(|i| {
                let ev = round_one_decimal(2.0 + f64::from(i) * 0.7);
                YearShare {
                    year: (current_year - i).to_string(),
                    ev,
                    ice: round_one_decimal(100.0 - ev),
                }
            })
            .collect()
    }

    /// EV and ICE totals per maker, omitting makers with no sales in either.
    pub fn dashboard_comparison(
        ev: &[SalesRecord],
        ice: &[SalesRecord],
        makers: &[String],
    ) -> Vec<DashboardComparison> {
        let ev_series = SalesAggregator::series_by_maker(ev, makers);
        let ice_series = SalesAggregator::series_by_maker(ice, makers);

        ev_series
            .into_iter()
            .zip(ice_series)
            .map(|((maker, ev_months), (_, ice_months))| DashboardComparison {
                maker: maker.to_string(),
                total_sales: EvIceTotals {
                    ev: ev_months.iter().sum(),
                    ice: ice_months.iter().sum(),
                },
                monthly_data: MonthCode::ALL
                    .iter()
                    .map(|m| EvIceMonth {
                        month: m.code().to_string(),
                        ev: ev_months[m.index()],
                        ice: ice_months[m.index()],
                    })
                    .collect(),
            })
            .filter(|entry| entry.total_sales.ev > 0.0 || entry.total_sales.ice > 0.0)
            .collect()
    }

    /// Per-class and combined monthly sales with half-year growth.
    pub fn sales_overview(ev: &[SalesRecord], ice: &[SalesRecord]) -> SalesOverview {
        let ev_series = SalesAggregator::monthly_series(ev, MonthKeyMatch::Exact);
        let ice_series = SalesAggregator::monthly_series(ice, MonthKeyMatch::Exact);

        let mut combined = [0.0; 12];
        for (slot, (e, i)) in combined.iter_mut().zip(ev_series.iter().zip(&ice_series)) {
            *slot = e + i;
        }

        let ev_total: f64 = ev_series.iter().sum();
        let ice_total: f64 = ice_series.iter().sum();

        SalesOverview {
            ev: ClassSales {
                total_sales: ev_total,
                monthly_data: labelled_series(&ev_series),
            },
            ice: ClassSales {
                total_sales: ice_total,
                monthly_data: labelled_series(&ice_series),
            },
            total: ev_total + ice_total,
            growth: GrowthCalculator::half_year_growth(&combined),
            monthly_data: MonthCode::ALL
                .iter()
                .map(|m| CombinedMonth {
                    month: m.short_label().to_string(),
                    ev: ev_series[m.index()],
                    ice: ice_series[m.index()],
                    total: combined[m.index()],
                })
                .collect(),
        }
    }

    /// Distinct requested makers, or the defaults when none were given.
    pub fn comparison_makers(requested: Option<Vec<String>>) -> Vec<String> {
        match requested {
            Some(makers) if !makers.is_empty() => unique_makers(&makers)
                .into_iter()
                .map(str::to_string)
                .collect(),
            _ => DEFAULT_COMPARISON_MAKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

/// Series as `{month: "Jan", sales}` entries.
fn labelled_series(series: &[f64; 12]) -> Vec<MonthlySales> {
    MonthCode::ALL
        .iter()
        .map(|m| MonthlySales {
            month: m.short_label().to_string(),
            sales: series[m.index()],
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(maker: &str, model: Option<&str>) -> SalesRecord {
        let mut r = SalesRecord::new("2023", "Goa", maker);
        r.model = model.map(str::to_string);
        r
    }

    // ── class_analytics ───────────────────────────────────────────────────────

    #[test]
    fn test_class_analytics_totals_and_growth() {
        let records = vec![
            record("OLA", Some("S1"))
                .with_month("NOV", 100.0)
                .with_month("DEC", 150.0),
            record("ATHER", None).with_month("JAN", "1,000"),
        ];
        let analytics = SalesAnalysis::class_analytics(&records);

        assert_eq!(analytics.monthly_data.len(), 12);
        assert_eq!(analytics.monthly_data[0].month, "Jan");
        assert_eq!(analytics.monthly_data[0].sales, 1000.0);
        assert_eq!(analytics.total_sales, 1250.0);
        assert_eq!(analytics.growth, 50.0);
    }

    #[test]
    fn test_class_analytics_empty_growth_is_zero() {
        let analytics = SalesAnalysis::class_analytics(&[]);
        assert_eq!(analytics.growth, 0.0);
        assert!(analytics.top_sellers.is_empty());
        let json = serde_json::to_string(&analytics).unwrap();
        assert!(!json.contains("NaN"));
        assert!(json.contains("topSellers"));
    }

    #[test]
    fn test_top_sellers_grouped_by_maker_and_model() {
        let records = vec![
            record("OLA", Some("S1")).with_month("JAN", 10.0),
            record("OLA", Some("S1")).with_month("FEB", 15.0),
            record("OLA", None).with_month("JAN", 20.0),
            record("ATHER", Some("450X")).with_month("Jan", 30.0),
        ];
        let top = SalesAnalysis::top_sellers(&records, 5);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].maker, "ATHER");
        assert_eq!(top[0].sales, 30.0);
        assert_eq!((top[1].model.as_str(), top[1].sales), ("S1", 25.0));
        assert_eq!(top[2].model, "Unknown");
    }

    #[test]
    fn test_top_sellers_limit() {
        let records: Vec<SalesRecord> = (0..8)
            .map(|i| record(&format!("M{i}"), None).with_month("JAN", f64::from(i)))
            .collect();
        let top = SalesAnalysis::top_sellers(&records, TOP_SELLER_LIMIT);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].maker, "M7");
    }

    // ── market_trends ─────────────────────────────────────────────────────────

    #[test]
    fn test_market_trends_shares() {
        let ev = vec![record("OLA", None).with_month("JAN", 1.0)];
        let ice = vec![record("HONDA", None).with_month("JAN", 2.0)];
        let trends = SalesAnalysis::market_trends(&ev, &ice, 2025);

        assert_eq!(trends.ev_share[0].month, "Jan");
        assert_eq!(trends.ev_share[0].share, 33.3);
        assert_eq!(trends.ice_share[0].share, 66.7);
        assert_eq!(trends.ev_share[1].share, 0.0);
        assert_eq!(trends.ice_share[1].share, 0.0);
    }

    #[test]
    fn test_synthetic_year_comparison() {
        let series = SalesAnalysis::synthetic_year_comparison(2025);
        let years: Vec<&str> = series.iter().map(|y| y.year.as_str()).collect();
        assert_eq!(years, vec!["2021", "2022", "2023", "2024", "2025"]);
        assert_eq!(series[0].ev, 4.8);
        assert_eq!(series[0].ice, 95.2);
        assert_eq!(series[4].ev, 2.0);
        assert_eq!(series[4].ice, 98.0);
    }

    // ── dashboard_comparison ──────────────────────────────────────────────────

    #[test]
    fn test_dashboard_comparison_drops_empty_makers() {
        let ev = vec![record("TATA MOTORS", None).with_month("JAN", 40.0)];
        let ice = vec![record("HYUNDAI", None).with_month("MAR", 70.0)];
        let makers = SalesAnalysis::comparison_makers(None);
        let result = SalesAnalysis::dashboard_comparison(&ev, &ice, &makers);

        let names: Vec<&str> = result.iter().map(|c| c.maker.as_str()).collect();
        assert_eq!(names, vec!["TATA MOTORS", "HYUNDAI"]);
        assert_eq!(result[0].total_sales, EvIceTotals { ev: 40.0, ice: 0.0 });
        assert_eq!(result[1].monthly_data[2].month, "MAR");
        assert_eq!(result[1].monthly_data[2].ice, 70.0);
    }

    #[test]
    fn test_comparison_makers_defaults_and_dedupe() {
        assert_eq!(
            SalesAnalysis::comparison_makers(None),
            vec!["TATA MOTORS", "MARUTI SUZUKI", "HYUNDAI"]
        );
        assert_eq!(
            SalesAnalysis::comparison_makers(Some(vec!["KIA".into(), "KIA".into()])),
            vec!["KIA"]
        );
    }

    // ── sales_overview ────────────────────────────────────────────────────────

    #[test]
    fn test_sales_overview_half_year_growth() {
        let ev = vec![record("OLA", None)
            .with_month("JAN", 50.0)
            .with_month("JUL", 60.0)];
        let ice = vec![record("HONDA", None)
            .with_month("FEB", 50.0)
            .with_month("AUG", 90.0)];
        let overview = SalesAnalysis::sales_overview(&ev, &ice);

        assert_eq!(overview.ev.total_sales, 110.0);
        assert_eq!(overview.ice.total_sales, 140.0);
        assert_eq!(overview.total, 250.0);
        assert_eq!(overview.growth, 50.0);
        assert_eq!(overview.monthly_data[6].month, "Jul");
        assert_eq!(overview.monthly_data[6].total, 60.0);
        assert_eq!(overview.ice.monthly_data[7].sales, 90.0);
    }

    #[test]
    fn test_sales_overview_empty() {
        let overview = SalesAnalysis::sales_overview(&[], &[]);
        assert_eq!(overview.total, 0.0);
        assert_eq!(overview.growth, 0.0);
        let json = serde_json::to_value(&overview).unwrap();
        assert!(json["ev"]["monthlyData"].is_array());
        assert_eq!(json["monthlyData"].as_array().unwrap().len(), 12);
    }
}
