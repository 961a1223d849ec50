//! Canonical income-statement record.
//!
//! A [`CanonicalStatement`] is built once by the normalizer and never mutated
//! afterwards. Every period carries exactly one [`LineItemValue`] per catalog
//! entry, in catalog order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use finmodel_core::{PeriodType, Symbol};

use crate::resolver::Confidence;

/// Value of one line item in one period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItemValue {
    /// Line-item identifier.
    pub line_item: String,
    /// Reported value, or `None` when absent.
    pub value: Option<f64>,
    /// Raw field the value was read from.
    pub source: Option<String>,
    /// Confidence in the value.
    pub confidence: Confidence,
    /// Provenance note.
    pub note: Option<String>,
}

/// Metrics derived from the line items of a period.
///
/// Ratios and growth rates are fractions (`0.25` is 25%).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    /// Gross profit / revenue.
    pub gross_margin: Option<f64>,
    /// Operating income / revenue.
    pub operating_margin: Option<f64>,
    /// Net income / revenue.
    pub net_margin: Option<f64>,
    /// Operating expenses / revenue.
    pub operating_expense_ratio: Option<f64>,
    /// Net income / diluted shares.
    pub diluted_eps: Option<f64>,
    /// Revenue growth against the same period one year earlier.
    pub revenue_growth_yoy: Option<f64>,
    /// Gross profit growth against the same period one year earlier.
    pub gross_profit_growth_yoy: Option<f64>,
    /// Operating income growth against the same period one year earlier.
    pub operating_income_growth_yoy: Option<f64>,
    /// Net income growth against the same period one year earlier.
    pub net_income_growth_yoy: Option<f64>,
    /// Diluted EPS growth against the same period one year earlier.
    pub eps_growth_yoy: Option<f64>,
    /// Revenue growth against the previous quarter (quarterly statements only).
    pub revenue_growth_qoq: Option<f64>,
    /// Gross profit growth against the previous quarter.
    pub gross_profit_growth_qoq: Option<f64>,
    /// Operating income growth against the previous quarter.
    pub operating_income_growth_qoq: Option<f64>,
    /// Net income growth against the previous quarter.
    pub net_income_growth_qoq: Option<f64>,
}

/// One dated period of the canonical statement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPeriod {
    /// Period-end date.
    pub period_end: NaiveDate,
    /// One value per catalog entry, in catalog order.
    pub items: Vec<LineItemValue>,
    /// Derived metrics.
    pub metrics: PeriodMetrics,
}

impl CanonicalPeriod {
    /// Returns the entry for a line item.
    #[must_use]
    pub fn get(&self, line_item: &str) -> Option<&LineItemValue> {
        self.items.iter().find(|v| v.line_item == line_item)
    }

    /// Returns the value of a line item, if reported.
    #[must_use]
    pub fn value(&self, line_item: &str) -> Option<f64> {
        self.get(line_item).and_then(|v| v.value)
    }
}

/// Row label of a line item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemLabel {
    /// Line-item identifier.
    pub id: String,
    /// Human display name.
    pub display_name: String,
}

/// Normalized income statement for one ticker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalStatement {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Company display name (falls back to the ticker).
    pub company_name: String,
    /// Granularity of the periods.
    pub period_type: PeriodType,
    /// Row labels in catalog order.
    pub line_items: Vec<LineItemLabel>,
    /// Periods, most recent first, unique by date.
    pub periods: Vec<CanonicalPeriod>,
}

impl CanonicalStatement {
    /// Returns true if no period survived normalization.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Returns the most recent period.
    #[must_use]
    pub fn latest(&self) -> Option<&CanonicalPeriod> {
        self.periods.first()
    }

    /// Returns the values of one line item across periods, most recent first.
    pub fn series<'a>(&'a self, line_item: &'a str) -> impl Iterator<Item = Option<f64>> + 'a {
        self.periods.iter().map(move |p| p.value(line_item))
    }
}
