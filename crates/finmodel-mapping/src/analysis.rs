//! Multi-period analysis of the key line items.
//!
//! Both views look at the most recent [`ANALYSIS_YEARS`] years of periods:
//! [`annual_summaries`] totals them by calendar year, [`key_metrics`]
//! summarizes each key line item over the whole window.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::canonical::{CanonicalPeriod, CanonicalStatement};
use crate::catalog::ids;
use crate::metrics::growth;

/// Line items covered by the analysis, in display order.
pub const KEY_LINE_ITEMS: [&str; 4] = [
    ids::REVENUES,
    ids::GROSS_PROFIT,
    ids::OPERATING_INCOME,
    ids::NET_INCOME,
];

/// Number of years in the analysis window.
pub const ANALYSIS_YEARS: usize = 3;

/// One value per key line item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyFigures {
    /// Revenue.
    pub revenue: Option<f64>,
    /// Gross profit.
    pub gross_profit: Option<f64>,
    /// Operating income.
    pub operating_income: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
}

impl KeyFigures {
    fn from_fn(mut f: impl FnMut(&str) -> Option<f64>) -> Self {
        Self {
            revenue: f(ids::REVENUES),
            gross_profit: f(ids::GROSS_PROFIT),
            operating_income: f(ids::OPERATING_INCOME),
            net_income: f(ids::NET_INCOME),
        }
    }

    /// Returns the value for a key line item id.
    #[must_use]
    pub fn get(&self, line_item: &str) -> Option<f64> {
        match line_item {
            ids::REVENUES => self.revenue,
            ids::GROSS_PROFIT => self.gross_profit,
            ids::OPERATING_INCOME => self.operating_income,
            ids::NET_INCOME => self.net_income,
            _ => None,
        }
    }
}

/// Key line items totalled over one calendar year.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnualSummary {
    /// Calendar year of the period-end dates.
    pub year: i32,
    /// Number of periods that fell in the year.
    pub period_count: usize,
    /// Sum of the reported values; `None` if no period reported the item.
    pub totals: KeyFigures,
    /// Growth of the totals against the previous year in the list.
    ///
    /// `None` when the two years cover a different number of periods.
    pub growth: KeyFigures,
}

/// Three-year summary of one key line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyMetricSummary {
    /// Line item id.
    pub line_item: String,
    /// Value in the most recent period.
    pub latest: Option<f64>,
    /// Growth of the latest value against the same period one year earlier.
    pub yoy_change: Option<f64>,
    /// Mean of the reported values in the window.
    pub average: Option<f64>,
    /// Compound annual growth rate over the window.
    ///
    /// Requires a full window and a positive starting value.
    pub cagr: Option<f64>,
}

/// The most recent periods covering [`ANALYSIS_YEARS`] years.
fn window(statement: &CanonicalStatement) -> &[CanonicalPeriod] {
    let len = ANALYSIS_YEARS * statement.period_type.periods_per_year();
    &statement.periods[..statement.periods.len().min(len)]
}

fn total(values: impl Iterator<Item = f64>) -> Option<f64> {
    values.fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Returns `(end / start)^(1 / years) - 1`.
///
/// `None` unless both values are reported, `start` is positive and the
/// result is finite.
#[must_use]
pub fn cagr(start: Option<f64>, end: Option<f64>, years: f64) -> Option<f64> {
    match (start, end) {
        (Some(s), Some(e)) if s > 0.0 && e >= 0.0 && years > 0.0 => {
            let rate = (e / s).powf(years.recip()) - 1.0;
            rate.is_finite().then_some(rate)
        }
        _ => None,
    }
}

/// Totals the key line items by calendar year, most recent year first.
///
/// Returns nothing when the window holds less than one year of periods.
#[must_use]
pub fn annual_summaries(statement: &CanonicalStatement) -> Vec<AnnualSummary> {
    let periods = window(statement);
    if periods.len() < statement.period_type.periods_per_year() {
        return Vec::new();
    }

    let mut years: BTreeMap<i32, Vec<&CanonicalPeriod>> = BTreeMap::new();
    for period in periods {
        years.entry(period.period_end.year()).or_default().push(period);
    }

    let mut summaries: Vec<AnnualSummary> = years
        .into_iter()
        .rev()
        .map(|(year, periods)| AnnualSummary {
            year,
            period_count: periods.len(),
            totals: KeyFigures::from_fn(|id| total(periods.iter().filter_map(|p| p.value(id)))),
            growth: KeyFigures::default(),
        })
        .collect();

    for i in 1..summaries.len() {
        let (current, prior) = (summaries[i - 1], summaries[i]);
        if current.period_count == prior.period_count {
            summaries[i - 1].growth =
                KeyFigures::from_fn(|id| growth(current.totals.get(id), prior.totals.get(id)));
        }
    }

    summaries
}

/// Summarizes each key line item over the analysis window.
#[must_use]
pub fn key_metrics(statement: &CanonicalStatement) -> Vec<KeyMetricSummary> {
    let periods = window(statement);
    let full = periods.len() == ANALYSIS_YEARS * statement.period_type.periods_per_year();
    let year_ago = statement.period_type.periods_per_year();

    KEY_LINE_ITEMS
        .iter()
        .map(|&id| {
            let latest = periods.first().and_then(|p| p.value(id));
            let values: Vec<f64> = periods.iter().filter_map(|p| p.value(id)).collect();
            let average =
                (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);

            KeyMetricSummary {
                line_item: id.to_string(),
                latest,
                yoy_change: growth(latest, periods.get(year_ago).and_then(|p| p.value(id))),
                average,
                cagr: if full {
                    cagr(
                        periods.last().and_then(|p| p.value(id)),
                        latest,
                        ANALYSIS_YEARS as f64,
                    )
                } else {
                    None
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{LineItemValue, PeriodMetrics};
    use crate::resolver::Confidence;
    use chrono::NaiveDate;
    use finmodel_core::{PeriodType, Symbol};

    fn quarter(year: i32, month: u32, revenue: f64, net_income: Option<f64>) -> CanonicalPeriod {
        let mut items = vec![LineItemValue {
            line_item: ids::REVENUES.to_string(),
            value: Some(revenue),
            source: Some("revenues".to_string()),
            confidence: Confidence::High,
            note: None,
        }];
        items.push(LineItemValue {
            line_item: ids::NET_INCOME.to_string(),
            value: net_income,
            source: Some("net_income_loss".to_string()),
            confidence: if net_income.is_some() { Confidence::High } else { Confidence::None },
            note: None,
        });
        CanonicalPeriod {
            period_end: NaiveDate::from_ymd_opt(year, month, 28).unwrap(),
            items,
            metrics: PeriodMetrics::default(),
        }
    }

    fn statement(period_type: PeriodType, periods: Vec<CanonicalPeriod>) -> CanonicalStatement {
        CanonicalStatement {
            symbol: Symbol::new("ACME"),
            company_name: "Acme Corp".to_string(),
            period_type,
            line_items: Vec::new(),
            periods,
        }
    }

    /// Twelve quarters, 2022Q1 through 2024Q4, most recent first.
    fn twelve_quarters(revenue: impl Fn(usize) -> f64) -> Vec<CanonicalPeriod> {
        (0..12)
            .map(|i| {
                let year = 2024 - (i / 4) as i32;
                let month = 12 - 3 * (i % 4) as u32;
                quarter(year, month, revenue(i), Some(10.0))
            })
            .collect()
    }

    #[test]
    fn test_cagr_guards() {
        let rate = cagr(Some(100.0), Some(172.8), 3.0).unwrap();
        assert!((rate - 0.2).abs() < 1e-9);
        assert_eq!(cagr(Some(0.0), Some(100.0), 3.0), None);
        assert_eq!(cagr(Some(-10.0), Some(100.0), 3.0), None);
        assert_eq!(cagr(Some(100.0), Some(-10.0), 3.0), None);
        assert_eq!(cagr(None, Some(100.0), 3.0), None);
    }

    #[test]
    fn test_annual_totals_by_calendar_year() {
        let stmt = statement(PeriodType::Quarterly, twelve_quarters(|i| 100.0 - i as f64));
        let summaries = annual_summaries(&stmt);

        let years: Vec<i32> = summaries.iter().map(|s| s.year).collect();
        assert_eq!(years, vec![2024, 2023, 2022]);
        assert!(summaries.iter().all(|s| s.period_count == 4));

        assert_eq!(summaries[0].totals.revenue, Some(100.0 + 99.0 + 98.0 + 97.0));
        assert_eq!(summaries[1].totals.revenue, Some(96.0 + 95.0 + 94.0 + 93.0));
        assert_eq!(summaries[0].totals.net_income, Some(40.0));
        assert_eq!(summaries[0].totals.gross_profit, None);

        assert_eq!(summaries[0].growth.revenue, growth(Some(394.0), Some(378.0)));
        assert_eq!(summaries[0].growth.net_income, Some(0.0));
        assert_eq!(summaries[2].growth, KeyFigures::default());
    }

    #[test]
    fn test_partial_year_has_no_growth() {
        let periods = vec![
            quarter(2025, 3, 120.0, None),
            quarter(2024, 12, 100.0, None),
            quarter(2024, 9, 100.0, None),
            quarter(2024, 6, 100.0, None),
            quarter(2024, 3, 100.0, None),
        ];
        let summaries = annual_summaries(&statement(PeriodType::Quarterly, periods));
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].period_count, 1);
        assert_eq!(summaries[0].growth.revenue, None);
        assert_eq!(summaries[1].totals.revenue, Some(400.0));
        assert_eq!(summaries[1].totals.net_income, None);
    }

    #[test]
    fn test_annual_summaries_need_a_full_year() {
        let periods = vec![quarter(2024, 6, 100.0, None), quarter(2024, 3, 90.0, None)];
        assert!(annual_summaries(&statement(PeriodType::Quarterly, periods)).is_empty());
    }

    #[test]
    fn test_key_metrics_over_three_years() {
        // Revenue grows 20% a year: 172.8 now, 100 twelve quarters back.
        let stmt = statement(
            PeriodType::Quarterly,
            twelve_quarters(|i| match i {
                0 => 172.8,
                4 => 144.0,
                11 => 100.0,
                _ => 120.0,
            }),
        );
        let metrics = key_metrics(&stmt);
        assert_eq!(metrics.len(), KEY_LINE_ITEMS.len());

        let revenue = &metrics[0];
        assert_eq!(revenue.line_item, ids::REVENUES);
        assert_eq!(revenue.latest, Some(172.8));
        assert!((revenue.yoy_change.unwrap() - 0.2).abs() < 1e-9);
        let expected_avg = (172.8 + 144.0 + 100.0 + 9.0 * 120.0) / 12.0;
        assert!((revenue.average.unwrap() - expected_avg).abs() < 1e-9);
        assert!((revenue.cagr.unwrap() - 0.2).abs() < 1e-9);

        let gross = &metrics[1];
        assert_eq!(gross.latest, None);
        assert_eq!(gross.average, None);
        assert_eq!(gross.cagr, None);

        let net = &metrics[3];
        assert_eq!(net.average, Some(10.0));
        assert_eq!(net.cagr, Some(0.0));
    }

    #[test]
    fn test_key_metrics_short_history_has_no_cagr() {
        let mut periods = twelve_quarters(|_| 100.0);
        periods.truncate(11);
        let metrics = key_metrics(&statement(PeriodType::Quarterly, periods));
        assert_eq!(metrics[0].cagr, None);
        assert_eq!(metrics[0].average, Some(100.0));
        assert_eq!(metrics[0].yoy_change, Some(0.0));
    }
}
