//! Application of a field mapping across raw periods.

use std::collections::HashSet;
use tracing::{debug, warn};

use finmodel_core::types::Numeric;
use finmodel_core::{RawPeriod, RawStatement, Result, StatementError};

use crate::canonical::{CanonicalPeriod, CanonicalStatement, LineItemLabel, LineItemValue, PeriodMetrics};
use crate::catalog::{LineItem, LineItemCatalog};
use crate::metrics;
use crate::resolver::{Confidence, FieldMapping, NOT_REPORTED};

/// Number of periods kept when no limit is given.
pub const DEFAULT_PERIOD_LIMIT: usize = 12;

const MISSING_IN_PERIOD: &str = "missing in this period";
const NON_NUMERIC: &str = "non-numeric value in provider data";

/// Builds a [`CanonicalStatement`] from raw periods and a field mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatementNormalizer {
    period_limit: usize,
}

impl Default for StatementNormalizer {
    fn default() -> Self {
        Self {
            period_limit: DEFAULT_PERIOD_LIMIT,
        }
    }
}

impl StatementNormalizer {
    /// Creates a normalizer keeping at most `period_limit` periods.
    ///
    /// A limit of zero is rejected by [`normalize`](Self::normalize).
    #[must_use]
    pub fn new(period_limit: usize) -> Self {
        Self { period_limit }
    }

    /// Returns the period limit.
    #[must_use]
    pub fn period_limit(&self) -> usize {
        self.period_limit
    }

    /// Normalizes a raw statement.
    ///
    /// Periods without a parsable end date are skipped. Periods sharing an end
    /// date keep the first one in provider order. The result is sorted most
    /// recent first and truncated to the period limit; growth metrics are
    /// computed before truncation so the oldest kept periods still see their
    /// prior year.
    ///
    /// # Errors
    /// Returns [`StatementError::EmptyInput`] when the provider returned no
    /// periods and [`StatementError::InvalidParameter`] when the period limit
    /// is zero.
    pub fn normalize(
        &self,
        raw: &RawStatement,
        mapping: &FieldMapping,
        catalog: &LineItemCatalog,
    ) -> Result<CanonicalStatement> {
        if raw.is_empty() {
            return Err(StatementError::EmptyInput(raw.symbol.to_string()));
        }
        if self.period_limit == 0 {
            return Err(StatementError::InvalidParameter(
                "Period limit must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut periods = Vec::with_capacity(raw.periods.len());
        for (index, raw_period) in raw.periods.iter().enumerate() {
            let Some(period_end) = raw_period.period_end_date() else {
                warn!(
                    symbol = %raw.symbol,
                    index,
                    period_end = ?raw_period.period_end,
                    "Skipping period without a valid end date"
                );
                continue;
            };
            if !seen.insert(period_end) {
                debug!(symbol = %raw.symbol, %period_end, "Dropping duplicate period");
                continue;
            }

            let items = catalog
                .iter()
                .map(|item| cell(item, raw_period, mapping, raw, period_end))
                .collect();
            periods.push(CanonicalPeriod {
                period_end,
                items,
                metrics: PeriodMetrics::default(),
            });
        }

        periods.sort_by(|a, b| b.period_end.cmp(&a.period_end));
        metrics::apply(&mut periods, raw.period_type);
        periods.truncate(self.period_limit);

        debug!(
            symbol = %raw.symbol,
            periods = periods.len(),
            "Normalized income statement"
        );

        Ok(CanonicalStatement {
            symbol: raw.symbol.clone(),
            company_name: raw.display_name().to_string(),
            period_type: raw.period_type,
            line_items: catalog
                .iter()
                .map(|item| LineItemLabel {
                    id: item.id.clone(),
                    display_name: item.display_name.clone(),
                })
                .collect(),
            periods,
        })
    }
}

fn cell(
    item: &LineItem,
    period: &RawPeriod,
    mapping: &FieldMapping,
    raw: &RawStatement,
    period_end: chrono::NaiveDate,
) -> LineItemValue {
    let resolution = mapping.get(&item.id);
    let Some((resolution, field)) =
        resolution.and_then(|r| r.raw_field.as_deref().map(|f| (r, f)))
    else {
        return absent(item, None, NOT_REPORTED);
    };

    match period.get(field).map(|v| v.numeric()) {
        None | Some(Numeric::Missing) => absent(item, Some(field), MISSING_IN_PERIOD),
        Some(Numeric::Malformed) => {
            warn!(
                symbol = %raw.symbol,
                %period_end,
                line_item = %item.id,
                field,
                "Non-numeric value in provider data"
            );
            absent(item, Some(field), NON_NUMERIC)
        }
        Some(Numeric::Value(value)) => LineItemValue {
            line_item: item.id.clone(),
            value: Some(value),
            source: Some(field.to_string()),
            confidence: resolution.confidence,
            note: resolution.note.clone(),
        },
    }
}

fn absent(item: &LineItem, source: Option<&str>, note: &str) -> LineItemValue {
    LineItemValue {
        line_item: item.id.clone(),
        value: None,
        source: source.map(str::to_string),
        confidence: Confidence::None,
        note: Some(note.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ids;
    use crate::resolver::{FieldResolver, MatchStrategy};
    use chrono::{Days, NaiveDate};
    use finmodel_core::{PeriodType, RawValue, Symbol};

    fn statement(periods: Vec<RawPeriod>) -> RawStatement {
        RawStatement::new(Symbol::new("ACME"), PeriodType::Quarterly, periods)
    }

    fn run(raw: &RawStatement, limit: usize) -> Result<CanonicalStatement> {
        let catalog = LineItemCatalog::institutional();
        let mapping = FieldResolver::default().resolve_statement(raw, catalog);
        StatementNormalizer::new(limit).normalize(raw, &mapping, catalog)
    }

    fn scenario_period(date: &str) -> RawPeriod {
        RawPeriod::new(date)
            .with_field("revenues", 1000.0)
            .with_field("cost_of_revenue", 400.0)
            .with_field("research_and_development", 100.0)
    }

    #[test]
    fn test_empty_input() {
        let result = run(&statement(Vec::new()), 12);
        assert!(matches!(result, Err(StatementError::EmptyInput(ref s)) if s == "ACME"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = run(&statement(vec![scenario_period("2024-06-30")]), 0);
        assert!(matches!(result, Err(StatementError::InvalidParameter(_))));
    }

    #[test]
    fn test_every_period_has_every_catalog_entry() {
        let raw = statement(vec![
            scenario_period("2024-06-30"),
            RawPeriod::new("2024-03-31").with_field("revenues", 900.0),
            RawPeriod::new("2023-12-31"),
        ]);
        let stmt = run(&raw, 12).unwrap();
        let catalog = LineItemCatalog::institutional();
        assert_eq!(stmt.periods.len(), 3);
        assert_eq!(stmt.line_items.len(), catalog.len());
        for period in &stmt.periods {
            let ids: Vec<&str> = period.items.iter().map(|v| v.line_item.as_str()).collect();
            let expected: Vec<&str> = catalog.iter().map(|item| item.id.as_str()).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn test_no_fabrication_for_unavailable_items() {
        let raw = statement(vec![
            scenario_period("2024-06-30"),
            scenario_period("2024-03-31").with_field("filing_note", "n/a"),
        ]);
        let catalog = LineItemCatalog::institutional();
        let mapping = FieldResolver::default().resolve_statement(&raw, catalog);
        let stmt = StatementNormalizer::default()
            .normalize(&raw, &mapping, catalog)
            .unwrap();

        for resolution in mapping.iter() {
            if resolution.strategy != MatchStrategy::Unavailable {
                continue;
            }
            for period in &stmt.periods {
                let cell = period.get(&resolution.line_item).unwrap();
                assert!(cell.value.is_none(), "{} fabricated", resolution.line_item);
                assert_eq!(cell.note.as_deref(), Some(NOT_REPORTED));
                assert_eq!(cell.confidence, Confidence::None);
            }
        }
    }

    #[test]
    fn test_scenario_values_and_notes() {
        let stmt = run(&statement(vec![scenario_period("2024-06-30")]), 12).unwrap();
        let period = &stmt.periods[0];
        assert_eq!(period.value(ids::REVENUES), Some(1000.0));
        assert_eq!(period.value(ids::COST_OF_GOODS_SOLD), Some(400.0));
        assert_eq!(period.value("ResearchAndDevelopmentExpense"), Some(100.0));

        let revenue = period.get(ids::REVENUES).unwrap();
        assert_eq!(revenue.source.as_deref(), Some("revenues"));
        assert_eq!(revenue.confidence, Confidence::High);

        let gross = period.get(ids::GROSS_PROFIT).unwrap();
        assert_eq!(gross.value, None);
        assert_eq!(gross.source, None);
        assert_eq!(gross.note.as_deref(), Some(NOT_REPORTED));
        assert_eq!(period.metrics.gross_margin, None);
    }

    #[test]
    fn test_missing_and_malformed_cells() {
        let raw = statement(vec![
            scenario_period("2024-06-30"),
            RawPeriod::new("2024-03-31")
                .with_field("revenues", "not a number")
                .with_field("cost_of_revenue", RawValue::Null),
        ]);
        let stmt = run(&raw, 12).unwrap();
        let older = &stmt.periods[1];

        let revenue = older.get(ids::REVENUES).unwrap();
        assert_eq!(revenue.value, None);
        assert_eq!(revenue.confidence, Confidence::None);
        assert_eq!(revenue.note.as_deref(), Some(NON_NUMERIC));

        let cogs = older.get(ids::COST_OF_GOODS_SOLD).unwrap();
        assert_eq!(cogs.value, None);
        assert_eq!(cogs.source.as_deref(), Some("cost_of_revenue"));
        assert_eq!(cogs.note.as_deref(), Some(MISSING_IN_PERIOD));

        let rnd = older.get("ResearchAndDevelopmentExpense").unwrap();
        assert_eq!(rnd.note.as_deref(), Some(MISSING_IN_PERIOD));
    }

    #[test]
    fn test_orders_and_truncates_to_most_recent() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 31).unwrap();
        let dates: Vec<NaiveDate> = (0..15u64)
            .map(|i| start.checked_add_days(Days::new(i * 91)).unwrap())
            .collect();
        // Provider order scrambled: odd indices first, then even ones.
        let periods = dates
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 2 == 1)
            .chain(dates.iter().enumerate().filter(|(i, _)| i % 2 == 0))
            .map(|(i, d)| scenario_period(&d.to_string()).with_field("revenues", i as f64 + 1.0))
            .collect();

        let stmt = run(&statement(periods), 12).unwrap();
        assert_eq!(stmt.periods.len(), 12);

        let mut expected = dates.clone();
        expected.sort_by(|a, b| b.cmp(a));
        expected.truncate(12);
        let actual: Vec<NaiveDate> = stmt.periods.iter().map(|p| p.period_end).collect();
        assert_eq!(actual, expected);

        // The oldest kept quarter still compares against a dropped one.
        assert!(stmt.periods[10].metrics.revenue_growth_yoy.is_some());
    }

    #[test]
    fn test_duplicate_dates_keep_first() {
        let raw = statement(vec![
            scenario_period("2024-06-30"),
            scenario_period("2024-06-30").with_field("revenues", 5.0),
        ]);
        let stmt = run(&raw, 12).unwrap();
        assert_eq!(stmt.periods.len(), 1);
        assert_eq!(stmt.periods[0].value(ids::REVENUES), Some(1000.0));
    }

    #[test]
    fn test_undated_periods_skipped() {
        let raw = statement(vec![
            scenario_period("2024-06-30"),
            RawPeriod::undated().with_field("revenues", 1.0),
            scenario_period("Q1 2024"),
        ]);
        let stmt = run(&raw, 12).unwrap();
        assert_eq!(stmt.periods.len(), 1);

        let raw = statement(vec![RawPeriod::undated().with_field("revenues", 1.0)]);
        let stmt = run(&raw, 12).unwrap();
        assert!(stmt.is_empty());
    }

    #[test]
    fn test_company_name_falls_back_to_ticker() {
        let raw = statement(vec![scenario_period("2024-06-30")]);
        assert_eq!(run(&raw, 12).unwrap().company_name, "ACME");
        let raw = raw.with_company_name("Acme Corp");
        assert_eq!(run(&raw, 12).unwrap().company_name, "Acme Corp");
    }
}
