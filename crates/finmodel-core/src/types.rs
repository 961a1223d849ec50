//! Core data types for raw provider data.
//!
//! This module defines the structures handed over by a provider before any
//! field mapping has happened:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`RawValue`] - One raw cell as the provider reported it
//! - [`RawPeriod`] - One reporting period with provider field names
//! - [`RawStatement`] - All periods returned for one ticker

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::frequency::PeriodType;

/// Date format used by providers for period-end dates.
pub const PERIOD_DATE_FORMAT: &str = "%Y-%m-%d";

/// A trading symbol/ticker.
///
/// Symbols are trimmed and uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, trimming and converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol is empty after trimming.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single raw cell as reported by the provider.
///
/// Providers wrap values in objects whose `value` key may be missing or null,
/// and occasionally send numbers as strings. The raw form is kept so the
/// normalizer can tell a missing cell from a malformed one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A JSON number.
    Number(f64),
    /// A string, possibly holding a number.
    Text(String),
    /// The value wrapper was absent or null.
    Null,
}

/// Result of reading a [`RawValue`] as a number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    /// A finite number.
    Value(f64),
    /// No value was reported.
    Missing,
    /// A value was reported but is not a finite number.
    Malformed,
}

impl RawValue {
    /// Reads the cell as a finite number.
    ///
    /// Numeric strings (`"1250.5"`) are accepted; anything else that is not a
    /// finite number is [`Numeric::Malformed`].
    #[must_use]
    pub fn numeric(&self) -> Numeric {
        match self {
            Self::Null => Numeric::Missing,
            Self::Number(v) if v.is_finite() => Numeric::Value(*v),
            Self::Number(_) => Numeric::Malformed,
            Self::Text(s) if s.trim().is_empty() => Numeric::Missing,
            Self::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Numeric::Value(v),
                _ => Numeric::Malformed,
            },
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Null, Self::Number)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One reporting period as returned by the provider.
///
/// Field names are kept exactly as the provider sent them. They are stored in
/// a sorted map, so iteration order (and therefore tie-breaking during field
/// resolution) is the lexicographic order of field names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPeriod {
    /// Period-end date as sent by the provider (`YYYY-MM-DD`), if any.
    pub period_end: Option<String>,
    /// Raw field name to raw value.
    pub fields: BTreeMap<String, RawValue>,
}

impl RawPeriod {
    /// Creates an empty period with the given end date.
    #[must_use]
    pub fn new(period_end: impl Into<String>) -> Self {
        Self {
            period_end: Some(period_end.into()),
            fields: BTreeMap::new(),
        }
    }

    /// Creates an empty period without an end date.
    #[must_use]
    pub fn undated() -> Self {
        Self::default()
    }

    /// Adds a field, replacing any previous value under the same name.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts a field, replacing any previous value under the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<RawValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns the raw value for a field name, if the provider sent one.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&RawValue> {
        self.fields.get(name)
    }

    /// Returns the field names of this period in iteration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns the number of fields in this period.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the period has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses the period-end date.
    ///
    /// Returns `None` if the date is missing or not in `YYYY-MM-DD` form.
    #[must_use]
    pub fn period_end_date(&self) -> Option<NaiveDate> {
        let raw = self.period_end.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, PERIOD_DATE_FORMAT).ok()
    }
}

/// All raw periods a provider returned for one ticker.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawStatement {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Company name, when the provider reports one.
    pub company_name: Option<String>,
    /// Granularity of the periods.
    pub period_type: PeriodType,
    /// Periods in provider order.
    pub periods: Vec<RawPeriod>,
}

impl RawStatement {
    /// Creates a raw statement with required fields.
    #[must_use]
    pub fn new(symbol: Symbol, period_type: PeriodType, periods: Vec<RawPeriod>) -> Self {
        Self {
            symbol,
            company_name: None,
            period_type,
            periods,
        }
    }

    /// Sets the company name.
    #[must_use]
    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.company_name = (!name.trim().is_empty()).then_some(name);
        self
    }

    /// Returns the company name, falling back to the ticker.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.company_name
            .as_deref()
            .unwrap_or_else(|| self.symbol.as_str())
    }

    /// Returns the period with the most fields.
    ///
    /// Ties go to the earliest period in provider order, which is normally the
    /// most recent one.
    #[must_use]
    pub fn representative_period(&self) -> Option<&RawPeriod> {
        self.periods
            .iter()
            .enumerate()
            .max_by(|(ia, a), (ib, b)| a.len().cmp(&b.len()).then(ib.cmp(ia)))
            .map(|(_, p)| p)
    }

    /// Returns true if the provider returned no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}
