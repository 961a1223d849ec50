//! Reporting period granularity.
//!
//! This module defines [`PeriodType`], the granularity requested from the
//! provider and carried through to the canonical statement.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StatementError;

/// Period type for income-statement data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    /// Quarterly reporting period.
    #[default]
    Quarterly,
    /// Annual reporting period.
    Annual,
}

impl PeriodType {
    /// Returns the lowercase name used in requests and cache keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
        }
    }

    /// Number of periods between a period and the same period one year earlier.
    #[must_use]
    pub const fn periods_per_year(&self) -> usize {
        match self {
            Self::Quarterly => 4,
            Self::Annual => 1,
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodType {
    type Err = StatementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quarterly" | "quarter" | "q" => Ok(Self::Quarterly),
            "annual" | "annually" | "a" => Ok(Self::Annual),
            other => Err(StatementError::InvalidParameter(format!(
                "Unknown period type: {other}. Supported: quarterly, annual"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period_type() {
        assert_eq!("quarterly".parse::<PeriodType>().unwrap(), PeriodType::Quarterly);
        assert_eq!("Annual".parse::<PeriodType>().unwrap(), PeriodType::Annual);
        assert_eq!("q".parse::<PeriodType>().unwrap(), PeriodType::Quarterly);
        assert!("monthly".parse::<PeriodType>().is_err());
    }

    #[test]
    fn test_periods_per_year() {
        assert_eq!(PeriodType::Quarterly.periods_per_year(), 4);
        assert_eq!(PeriodType::Annual.periods_per_year(), 1);
    }
}
