//! Derived metrics.
//!
//! Every metric is `None` unless all operands are reported and the
//! denominator is non-zero.

use finmodel_core::PeriodType;

use crate::canonical::{CanonicalPeriod, PeriodMetrics};
use crate::catalog::ids;

/// Returns `numerator / denominator`, or `None` if either is absent or the
/// denominator is zero.
#[must_use]
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Returns `(current - prior) / |prior|`, or `None` if either is absent or
/// the prior value is zero.
#[must_use]
pub fn growth(current: Option<f64>, prior: Option<f64>) -> Option<f64> {
    match (current, prior) {
        (Some(c), Some(p)) if p != 0.0 => Some((c - p) / p.abs()),
        _ => None,
    }
}

/// Computes the metrics that depend on a single period.
#[must_use]
pub fn point_in_time(period: &CanonicalPeriod) -> PeriodMetrics {
    let revenue = period.value(ids::REVENUES);
    PeriodMetrics {
        gross_margin: ratio(period.value(ids::GROSS_PROFIT), revenue),
        operating_margin: ratio(period.value(ids::OPERATING_INCOME), revenue),
        net_margin: ratio(period.value(ids::NET_INCOME), revenue),
        operating_expense_ratio: ratio(period.value(ids::OPERATING_EXPENSES), revenue),
        diluted_eps: ratio(
            period.value(ids::NET_INCOME),
            period.value(ids::DILUTED_SHARES),
        ),
        ..PeriodMetrics::default()
    }
}

/// Fills in all metrics for periods sorted most recent first.
///
/// Growth compares period `i` with period `i + lag`; the lag is one year of
/// periods for year-over-year and one period for quarter-over-quarter.
pub fn apply(periods: &mut [CanonicalPeriod], period_type: PeriodType) {
    for period in periods.iter_mut() {
        period.metrics = point_in_time(period);
    }

    let yoy_lag = period_type.periods_per_year();
    for i in 0..periods.len() {
        let mut metrics = periods[i].metrics;

        if let Some(prior) = periods.get(i + yoy_lag) {
            let current = &periods[i];
            metrics.revenue_growth_yoy =
                growth(current.value(ids::REVENUES), prior.value(ids::REVENUES));
            metrics.gross_profit_growth_yoy = growth(
                current.value(ids::GROSS_PROFIT),
                prior.value(ids::GROSS_PROFIT),
            );
            metrics.operating_income_growth_yoy = growth(
                current.value(ids::OPERATING_INCOME),
                prior.value(ids::OPERATING_INCOME),
            );
            metrics.net_income_growth_yoy =
                growth(current.value(ids::NET_INCOME), prior.value(ids::NET_INCOME));
            metrics.eps_growth_yoy = growth(current.metrics.diluted_eps, prior.metrics.diluted_eps);
        }

        if period_type == PeriodType::Quarterly
            && let Some(prior) = periods.get(i + 1)
        {
            let current = &periods[i];
            metrics.revenue_growth_qoq =
                growth(current.value(ids::REVENUES), prior.value(ids::REVENUES));
            metrics.gross_profit_growth_qoq = growth(
                current.value(ids::GROSS_PROFIT),
                prior.value(ids::GROSS_PROFIT),
            );
            metrics.operating_income_growth_qoq = growth(
                current.value(ids::OPERATING_INCOME),
                prior.value(ids::OPERATING_INCOME),
            );
            metrics.net_income_growth_qoq =
                growth(current.value(ids::NET_INCOME), prior.value(ids::NET_INCOME));
        }

        periods[i].metrics = metrics;
    }
}
