//! Wire types for `/vX/reference/financials`.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use finmodel_core::{PeriodType, RawPeriod, RawStatement, RawValue, Symbol};

/// Top-level response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct FinancialsResponse {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) results: Option<Vec<FinancialsResult>>,
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
}

/// One filing period.
#[derive(Debug, Deserialize)]
pub(crate) struct FinancialsResult {
    #[serde(default)]
    end_date: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    financials: Option<Financials>,
}

#[derive(Debug, Default, Deserialize)]
struct Financials {
    #[serde(default)]
    income_statement: Option<BTreeMap<String, Value>>,
}

impl FinancialsResponse {
    /// Returns the provider's error text, if the envelope reports one.
    pub(crate) fn error_message(&self) -> Option<String> {
        let failed = self
            .status
            .as_deref()
            .is_some_and(|s| !s.eq_ignore_ascii_case("OK") && !s.eq_ignore_ascii_case("DELAYED"));
        if !failed && self.error.is_none() {
            return None;
        }
        Some(
            self.error
                .clone()
                .or_else(|| self.message.clone())
                .unwrap_or_else(|| format!("status {}", self.status.as_deref().unwrap_or("unknown"))),
        )
    }

    /// Converts the response into a raw statement, keeping provider order.
    pub(crate) fn into_raw_statement(self, symbol: &Symbol, period_type: PeriodType) -> RawStatement {
        let results = self.results.unwrap_or_default();

        let company_name = results
            .iter()
            .filter_map(|r| r.company_name.as_deref())
            .find(|name| !name.trim().is_empty())
            .map(str::to_string);

        let periods = results
            .into_iter()
            .map(|result| {
                let fields = result
                    .financials
                    .and_then(|f| f.income_statement)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(name, entry)| (name, raw_value(entry)))
                    .collect();
                RawPeriod {
                    period_end: result.end_date,
                    fields,
                }
            })
            .collect();

        let statement = RawStatement::new(symbol.clone(), period_type, periods);
        match company_name {
            Some(name) => statement.with_company_name(name),
            None => statement,
        }
    }
}

/// Unwraps a `{ "value": … }` entry. Bare scalars are accepted as well.
fn raw_value(entry: Value) -> RawValue {
    let value = match entry {
        Value::Object(mut map) => map.remove("value").unwrap_or(Value::Null),
        other => other,
    };
    match value {
        Value::Null => RawValue::Null,
        Value::Number(n) => n.as_f64().map_or(RawValue::Null, RawValue::Number),
        Value::String(s) => RawValue::Text(s),
        other => RawValue::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finmodel_core::types::Numeric;

    const FIXTURE: &str = r#"{
        "results": [
            {
                "start_date": "2024-03-31",
                "end_date": "2024-06-29",
                "timeframe": "quarterly",
                "fiscal_period": "Q3",
                "fiscal_year": "2024",
                "company_name": "Apple Inc.",
                "financials": {
                    "income_statement": {
                        "revenues": {"value": 85777000000, "unit": "USD", "label": "Revenues", "order": 100},
                        "cost_of_revenue": {"value": 46099000000.0, "unit": "USD", "label": "Cost Of Revenue", "order": 300},
                        "gross_profit": {"unit": "USD", "label": "Gross Profit", "order": 800},
                        "diluted_earnings_per_share": {"value": "1.40", "unit": "USD / shares"}
                    },
                    "balance_sheet": {
                        "assets": {"value": 331612000000}
                    }
                }
            },
            {
                "end_date": "2024-03-30",
                "company_name": "",
                "financials": {
                    "income_statement": {
                        "revenues": {"value": null},
                        "flag": {"value": true}
                    }
                }
            },
            {"company_name": "Apple Inc."}
        ],
        "status": "OK",
        "request_id": "abc",
        "count": 3
    }"#;

    #[test]
    fn test_fixture_to_raw_statement() {
        let response: FinancialsResponse = serde_json::from_str(FIXTURE).unwrap();
        assert!(response.error_message().is_none());

        let raw = response.into_raw_statement(&Symbol::new("aapl"), PeriodType::Quarterly);
        assert_eq!(raw.symbol.as_str(), "AAPL");
        assert_eq!(raw.company_name.as_deref(), Some("Apple Inc."));
        assert_eq!(raw.periods.len(), 3);

        let latest = &raw.periods[0];
        assert_eq!(latest.period_end.as_deref(), Some("2024-06-29"));
        assert_eq!(latest.len(), 4);
        assert_eq!(
            latest.get("revenues").map(RawValue::numeric),
            Some(Numeric::Value(85_777_000_000.0))
        );
        assert_eq!(latest.get("gross_profit"), Some(&RawValue::Null));
        assert_eq!(
            latest.get("diluted_earnings_per_share").map(RawValue::numeric),
            Some(Numeric::Value(1.4))
        );
        assert!(latest.get("assets").is_none());

        let older = &raw.periods[1];
        assert_eq!(older.get("revenues"), Some(&RawValue::Null));
        assert_eq!(older.get("flag").map(RawValue::numeric), Some(Numeric::Malformed));

        assert!(raw.periods[2].period_end.is_none());
        assert!(raw.periods[2].is_empty());
    }

    #[test]
    fn test_missing_results_is_empty_statement() {
        let response: FinancialsResponse =
            serde_json::from_str(r#"{"status": "OK", "results": null}"#).unwrap();
        let raw = response.into_raw_statement(&Symbol::new("ZZZZ"), PeriodType::Annual);
        assert!(raw.is_empty());
        assert_eq!(raw.display_name(), "ZZZZ");
    }

    #[test]
    fn test_error_envelope() {
        let response: FinancialsResponse = serde_json::from_str(
            r#"{"status": "ERROR", "request_id": "x", "error": "Unknown API Key"}"#,
        )
        .unwrap();
        assert_eq!(response.error_message().as_deref(), Some("Unknown API Key"));

        let response: FinancialsResponse =
            serde_json::from_str(r#"{"status": "NOT_AUTHORIZED", "message": "upgrade plan"}"#)
                .unwrap();
        assert_eq!(response.error_message().as_deref(), Some("upgrade plan"));
    }
}
