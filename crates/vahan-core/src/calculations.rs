// ── Rounding ──────────────────────────────────────────────────────────────────

/// Round to one decimal place, the precision every percentage is reported at.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ── GrowthCalculator ──────────────────────────────────────────────────────────

/// Stateless growth and market-share arithmetic.
pub struct GrowthCalculator;

impl GrowthCalculator {
    /// Percentage change from `previous` to `latest`, one decimal.
    ///
    /// A zero `previous` has no meaningful ratio and yields `0.0` so the
    /// result is always a finite JSON number.
    pub fn percent_change(previous: f64, latest: f64) -> f64 {
        if previous == 0.0 {
            return 0.0;
        }
        let growth = ((latest / previous) - 1.0) * 100.0;
        if growth.is_finite() {
            round_one_decimal(growth)
        } else {
            0.0
        }
    }

    /// Growth of the last entry of `series` over the one before it.
    ///
    /// Returns `0.0` when fewer than two entries exist.
    pub fn trailing_growth(series: &[f64]) -> f64 {
        match series {
            [.., previous, latest] => Self::percent_change(*previous, *latest),
            _ => 0.0,
        }
    }

    /// Growth of the second half of a twelve-month series over the first.
    pub fn half_year_growth(monthly: &[f64; 12]) -> f64 {
        let first: f64 = monthly[..6].iter().sum();
        let second: f64 = monthly[6..].iter().sum();
        Self::percent_change(first, second)
    }

    /// `part` as a percentage of `whole`, one decimal, `0.0` for an empty whole.
    pub fn share_percent(part: f64, whole: f64) -> f64 {
        if whole > 0.0 {
            round_one_decimal(part / whole * 100.0)
        } else {
            0.0
        }
    }
}
