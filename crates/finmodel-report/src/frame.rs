//! DataFrame layouts.

use finmodel_core::{Result, StatementError};
use finmodel_mapping::{
    CanonicalStatement, KEY_LINE_ITEMS, LineItemValue, PeriodMetrics, annual_summaries,
    key_metrics,
};
use polars::prelude::*;

/// Name of the row-label column.
pub const LINE_ITEM_COLUMN: &str = "line_item";

/// Text of a cell the provider does not report, or a metric that cannot be
/// computed.
pub const NOT_AVAILABLE: &str = "N/A";

/// Text of a reported line item with no usable value in one period.
pub const MISSING_IN_PERIOD: &str = "missing";

/// Derived rows appended under the line items, with their labels.
pub const DERIVED_ROWS: &[(&str, fn(&PeriodMetrics) -> Option<f64>)] = &[
    ("Gross Margin", |m| m.gross_margin),
    ("Operating Margin", |m| m.operating_margin),
    ("Net Margin", |m| m.net_margin),
    ("Operating Expense Ratio", |m| m.operating_expense_ratio),
    ("Diluted EPS", |m| m.diluted_eps),
    ("Revenue Growth (YoY)", |m| m.revenue_growth_yoy),
];

/// Builds the statement layout.
///
/// Rows are the catalog line items (display names) followed by
/// [`DERIVED_ROWS`]; columns are `line_item` then one `YYYY-MM-DD` column per
/// period, most recent first. Absent values are null.
///
/// # Errors
/// Returns [`StatementError::Other`] if the frame cannot be assembled.
pub fn statement_frame(statement: &CanonicalStatement) -> Result<DataFrame> {
    let labels: Vec<&str> = statement
        .line_items
        .iter()
        .map(|label| label.display_name.as_str())
        .chain(DERIVED_ROWS.iter().map(|(label, _)| *label))
        .collect();

    let mut columns = Vec::with_capacity(statement.periods.len() + 1);
    columns.push(Column::new(LINE_ITEM_COLUMN.into(), labels));

    for period in &statement.periods {
        let values: Vec<Option<f64>> = statement
            .line_items
            .iter()
            .map(|label| period.value(&label.id))
            .chain(DERIVED_ROWS.iter().map(|(_, metric)| metric(&period.metrics)))
            .collect();
        columns.push(Column::new(period.period_end.to_string().into(), values));
    }

    DataFrame::new(columns).map_err(|e| StatementError::Other(e.to_string()))
}

/// Growth rows of [`growth_frame`], with their labels.
pub const GROWTH_ROWS: &[(&str, fn(&PeriodMetrics) -> Option<f64>)] = &[
    ("Revenue Growth (QoQ)", |m| m.revenue_growth_qoq),
    ("Gross Profit Growth (QoQ)", |m| m.gross_profit_growth_qoq),
    ("Operating Income Growth (QoQ)", |m| m.operating_income_growth_qoq),
    ("Net Income Growth (QoQ)", |m| m.net_income_growth_qoq),
    ("Revenue Growth (YoY)", |m| m.revenue_growth_yoy),
    ("Gross Profit Growth (YoY)", |m| m.gross_profit_growth_yoy),
    ("Operating Income Growth (YoY)", |m| m.operating_income_growth_yoy),
    ("Net Income Growth (YoY)", |m| m.net_income_growth_yoy),
    ("EPS Growth (YoY)", |m| m.eps_growth_yoy),
];

fn cell_text(cell: Option<&LineItemValue>) -> String {
    match cell {
        Some(LineItemValue { value: Some(v), .. }) => v.to_string(),
        Some(LineItemValue { source: Some(_), .. }) => MISSING_IN_PERIOD.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn metric_text(value: Option<f64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}

/// Builds the statement layout with every cell as text.
///
/// Same rows and columns as [`statement_frame`]. Line items the provider
/// does not report read [`NOT_AVAILABLE`]; reported items with no usable
/// value in a period read [`MISSING_IN_PERIOD`]. Derived metrics that cannot
/// be computed read [`NOT_AVAILABLE`].
///
/// # Errors
/// Returns [`StatementError::Other`] if the frame cannot be assembled.
pub fn display_frame(statement: &CanonicalStatement) -> Result<DataFrame> {
    let labels: Vec<&str> = statement
        .line_items
        .iter()
        .map(|label| label.display_name.as_str())
        .chain(DERIVED_ROWS.iter().map(|(label, _)| *label))
        .collect();

    let mut columns = Vec::with_capacity(statement.periods.len() + 1);
    columns.push(Column::new(LINE_ITEM_COLUMN.into(), labels));

    for period in &statement.periods {
        let cells: Vec<String> = statement
            .line_items
            .iter()
            .map(|label| cell_text(period.get(&label.id)))
            .chain(
                DERIVED_ROWS
                    .iter()
                    .map(|(_, metric)| metric_text(metric(&period.metrics))),
            )
            .collect();
        columns.push(Column::new(period.period_end.to_string().into(), cells));
    }

    DataFrame::new(columns).map_err(|e| StatementError::Other(e.to_string()))
}

/// Builds the period-over-period growth layout: [`GROWTH_ROWS`] by period.
///
/// # Errors
/// Returns [`StatementError::Other`] if the frame cannot be assembled.
pub fn growth_frame(statement: &CanonicalStatement) -> Result<DataFrame> {
    let labels: Vec<&str> = GROWTH_ROWS.iter().map(|(label, _)| *label).collect();

    let mut columns = Vec::with_capacity(statement.periods.len() + 1);
    columns.push(Column::new(LINE_ITEM_COLUMN.into(), labels));
    for period in &statement.periods {
        let values: Vec<Option<f64>> = GROWTH_ROWS
            .iter()
            .map(|(_, metric)| metric(&period.metrics))
            .collect();
        columns.push(Column::new(period.period_end.to_string().into(), values));
    }

    DataFrame::new(columns).map_err(|e| StatementError::Other(e.to_string()))
}

fn display_name<'a>(statement: &'a CanonicalStatement, id: &'a str) -> &'a str {
    statement
        .line_items
        .iter()
        .find(|label| label.id == id)
        .map_or(id, |label| label.display_name.as_str())
}

/// Builds the calendar-year layout: one row per key line item, one total
/// column per year (most recent first), then one `YYYY vs YYYY` growth
/// column per pair of adjacent years.
///
/// # Errors
/// Returns [`StatementError::Other`] if the frame cannot be assembled.
pub fn annual_frame(statement: &CanonicalStatement) -> Result<DataFrame> {
    let summaries = annual_summaries(statement);
    let labels: Vec<&str> = KEY_LINE_ITEMS
        .iter()
        .map(|id| display_name(statement, id))
        .collect();

    let mut columns = Vec::with_capacity(2 * summaries.len());
    columns.push(Column::new(LINE_ITEM_COLUMN.into(), labels));
    for summary in &summaries {
        let totals: Vec<Option<f64>> = KEY_LINE_ITEMS
            .iter()
            .map(|id| summary.totals.get(id))
            .collect();
        columns.push(Column::new(summary.year.to_string().into(), totals));
    }
    for pair in summaries.windows(2) {
        let growth: Vec<Option<f64>> = KEY_LINE_ITEMS
            .iter()
            .map(|id| pair[0].growth.get(id))
            .collect();
        let name = format!("{} vs {}", pair[0].year, pair[1].year);
        columns.push(Column::new(name.into(), growth));
    }

    DataFrame::new(columns).map_err(|e| StatementError::Other(e.to_string()))
}

/// Builds the key-metrics layout: one row per key line item with columns
/// `line_item`, `latest`, `yoy_change`, `average` and `cagr`.
///
/// # Errors
/// Returns [`StatementError::Other`] if the frame cannot be assembled.
pub fn key_metrics_frame(statement: &CanonicalStatement) -> Result<DataFrame> {
    let metrics = key_metrics(statement);
    let labels: Vec<&str> = metrics
        .iter()
        .map(|m| display_name(statement, &m.line_item))
        .collect();
    let latest: Vec<Option<f64>> = metrics.iter().map(|m| m.latest).collect();
    let yoy: Vec<Option<f64>> = metrics.iter().map(|m| m.yoy_change).collect();
    let average: Vec<Option<f64>> = metrics.iter().map(|m| m.average).collect();
    let cagr: Vec<Option<f64>> = metrics.iter().map(|m| m.cagr).collect();

    DataFrame::new(vec![
        Column::new(LINE_ITEM_COLUMN.into(), labels),
        Column::new("latest".into(), latest),
        Column::new("yoy_change".into(), yoy),
        Column::new("average".into(), average),
        Column::new("cagr".into(), cagr),
    ])
    .map_err(|e| StatementError::Other(e.to_string()))
}

/// Builds the provenance layout: one row per period and line item.
///
/// Columns: `period_end`, `line_item`, `value`, `source`, `confidence`, `note`.
///
/// # Errors
/// Returns [`StatementError::Other`] if the frame cannot be assembled.
pub fn provenance_frame(statement: &CanonicalStatement) -> Result<DataFrame> {
    let rows = statement.periods.len() * statement.line_items.len();
    let mut period_ends = Vec::with_capacity(rows);
    let mut line_items = Vec::with_capacity(rows);
    let mut values = Vec::with_capacity(rows);
    let mut sources = Vec::with_capacity(rows);
    let mut confidences = Vec::with_capacity(rows);
    let mut notes = Vec::with_capacity(rows);

    for period in &statement.periods {
        let date = period.period_end.to_string();
        for item in &period.items {
            period_ends.push(date.clone());
            line_items.push(item.line_item.clone());
            values.push(item.value);
            sources.push(item.source.clone());
            confidences.push(item.confidence.as_str());
            notes.push(item.note.clone());
        }
    }

    DataFrame::new(vec![
        Column::new("period_end".into(), period_ends),
        Column::new("line_item".into(), line_items),
        Column::new("value".into(), values),
        Column::new("source".into(), sources),
        Column::new("confidence".into(), confidences),
        Column::new("note".into(), notes),
    ])
    .map_err(|e| StatementError::Other(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use finmodel_core::{PeriodType, RawPeriod, RawStatement, Symbol};
    use finmodel_mapping::{FieldResolver, LineItemCatalog, StatementNormalizer};

    fn sample() -> CanonicalStatement {
        let raw = RawStatement::new(
            Symbol::new("ACME"),
            PeriodType::Quarterly,
            vec![
                RawPeriod::new("2024-03-31")
                    .with_field("revenues", 800.0)
                    .with_field("gross_profit", 400.0),
                RawPeriod::new("2024-06-30")
                    .with_field("revenues", 1000.0)
                    .with_field("gross_profit", 600.0),
            ],
        );
        let catalog = LineItemCatalog::institutional();
        let mapping = FieldResolver::default().resolve_statement(&raw, catalog);
        StatementNormalizer::default()
            .normalize(&raw, &mapping, catalog)
            .unwrap()
    }

    #[test]
    fn test_statement_frame_layout() {
        let statement = sample();
        let df = statement_frame(&statement).unwrap();

        assert_eq!(df.height(), statement.line_items.len() + DERIVED_ROWS.len());
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["line_item", "2024-06-30", "2024-03-31"]);

        let labels = df.column(LINE_ITEM_COLUMN).unwrap().str().unwrap();
        assert_eq!(labels.get(0), Some("Revenue"));
        assert_eq!(labels.get(statement.line_items.len()), Some("Gross Margin"));

        let latest = df.column("2024-06-30").unwrap().f64().unwrap();
        assert_eq!(latest.get(0), Some(1000.0));
        assert_eq!(latest.get(1), None);
        assert_eq!(latest.get(statement.line_items.len()), Some(0.6));
    }

    #[test]
    fn test_display_frame_markers() {
        let raw = RawStatement::new(
            Symbol::new("ACME"),
            PeriodType::Quarterly,
            vec![
                RawPeriod::new("2024-06-30")
                    .with_field("revenues", 1000.0)
                    .with_field("gross_profit", 600.0),
                RawPeriod::new("2024-03-31").with_field("revenues", 800.0),
            ],
        );
        let catalog = LineItemCatalog::institutional();
        let mapping = FieldResolver::default().resolve_statement(&raw, catalog);
        let statement = StatementNormalizer::default()
            .normalize(&raw, &mapping, catalog)
            .unwrap();
        let df = display_frame(&statement).unwrap();
        assert_eq!(df.shape(), statement_frame(&statement).unwrap().shape());

        let labels = df.column(LINE_ITEM_COLUMN).unwrap().str().unwrap();
        let gross_row = (0..df.height())
            .find(|&i| labels.get(i) == Some("Gross Profit"))
            .unwrap();
        let net_row = (0..df.height())
            .find(|&i| labels.get(i) == Some("Net Income"))
            .unwrap();

        let latest = df.column("2024-06-30").unwrap().str().unwrap();
        let older = df.column("2024-03-31").unwrap().str().unwrap();
        assert_eq!(latest.get(0), Some("1000"));
        assert_eq!(latest.get(gross_row), Some("600"));
        assert_eq!(older.get(gross_row), Some(MISSING_IN_PERIOD));
        assert_eq!(latest.get(net_row), Some(NOT_AVAILABLE));
        assert_eq!(latest.get(statement.line_items.len()), Some("0.6"));
        assert_eq!(older.get(statement.line_items.len()), Some(NOT_AVAILABLE));
    }

    #[test]
    fn test_growth_frame_layout() {
        let statement = sample();
        let df = growth_frame(&statement).unwrap();
        assert_eq!(df.height(), GROWTH_ROWS.len());
        assert_eq!(df.width(), 1 + statement.periods.len());

        let latest = df.column("2024-06-30").unwrap().f64().unwrap();
        assert_eq!(latest.get(0), Some(0.25));
        assert_eq!(latest.get(1), Some(0.5));
        assert_eq!(latest.get(4), None);
    }

    #[test]
    fn test_key_metrics_and_annual_frames() {
        let statement = sample();
        let df = key_metrics_frame(&statement).unwrap();
        assert_eq!(df.height(), KEY_LINE_ITEMS.len());
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["line_item", "latest", "yoy_change", "average", "cagr"]);

        let labels = df.column(LINE_ITEM_COLUMN).unwrap().str().unwrap();
        assert_eq!(labels.get(0), Some("Revenue"));
        let average = df.column("average").unwrap().f64().unwrap();
        assert_eq!(average.get(0), Some(900.0));
        assert_eq!(df.column("cagr").unwrap().f64().unwrap().get(0), None);

        // Two quarters are less than a year of periods.
        let annual = annual_frame(&statement).unwrap();
        assert_eq!(annual.width(), 1);
        assert_eq!(annual.height(), KEY_LINE_ITEMS.len());
    }

    #[test]
    fn test_provenance_frame_rows() {
        let statement = sample();
        let df = provenance_frame(&statement).unwrap();
        assert_eq!(df.height(), 2 * statement.line_items.len());

        let confidence = df.column("confidence").unwrap().str().unwrap();
        let source = df.column("source").unwrap().str().unwrap();
        assert_eq!(confidence.get(0), Some("high"));
        assert_eq!(source.get(0), Some("revenues"));
        assert_eq!(confidence.get(1), Some("none"));
        assert_eq!(source.get(1), None);
    }
}
