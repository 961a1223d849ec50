//! Non-gating consistency checks on a normalized statement.
//!
//! Diagnostics never change values; they only describe what a reviewer of the
//! statement should look at.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::CanonicalStatement;
use crate::catalog::ids;
use crate::resolver::{FieldMapping, MatchStrategy};

/// Relative tolerance for the gross-profit identity check.
pub const GROSS_PROFIT_TOLERANCE: f64 = 0.01;

const KEY_ITEMS: &[&str] = &[ids::REVENUES, ids::NET_INCOME];

/// Diagnostic severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Worth knowing.
    Info,
    /// Likely affects how the statement should be read.
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// One finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Line item concerned.
    pub line_item: String,
    /// Period concerned, if the finding is period-specific.
    pub period_end: Option<NaiveDate>,
    /// Description.
    pub message: String,
}

impl Diagnostic {
    fn new(severity: Severity, line_item: &str, period_end: Option<NaiveDate>, message: String) -> Self {
        Self {
            severity,
            line_item: line_item.to_string(),
            period_end,
            message,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.period_end {
            Some(date) => write!(f, "[{}] {} ({date}): {}", self.severity, self.line_item, self.message),
            None => write!(f, "[{}] {}: {}", self.severity, self.line_item, self.message),
        }
    }
}

/// Runs all checks against a statement and the mapping that produced it.
#[must_use]
pub fn diagnose(statement: &CanonicalStatement, mapping: &FieldMapping) -> Vec<Diagnostic> {
    let mut findings = Vec::new();

    for resolution in mapping.iter() {
        if resolution.strategy == MatchStrategy::Unavailable && KEY_ITEMS.contains(&resolution.line_item.as_str()) {
            findings.push(Diagnostic::new(
                Severity::Warning,
                &resolution.line_item,
                None,
                "key line item not reported by provider".to_string(),
            ));
        }
        if resolution.strategy == MatchStrategy::KeywordPartial {
            findings.push(Diagnostic::new(
                Severity::Info,
                &resolution.line_item,
                None,
                format!(
                    "matched by keywords only to '{}'; verify the mapping",
                    resolution.raw_field.as_deref().unwrap_or_default()
                ),
            ));
        }
    }

    for label in &statement.line_items {
        let missing = statement
            .series(&label.id)
            .filter(Option::is_none)
            .count();
        if missing > 0 && missing < statement.periods.len() {
            findings.push(Diagnostic::new(
                Severity::Info,
                &label.id,
                None,
                format!(
                    "missing in {missing} of {} periods",
                    statement.periods.len()
                ),
            ));
        }
    }

    for period in &statement.periods {
        let revenue = period.value(ids::REVENUES);
        if let (Some(revenue), Some(cogs), Some(gross)) = (
            revenue,
            period.value(ids::COST_OF_GOODS_SOLD),
            period.value(ids::GROSS_PROFIT),
        ) {
            let expected = revenue - cogs;
            let scale = expected.abs().max(gross.abs());
            if scale > 0.0 && (gross - expected).abs() > scale * GROSS_PROFIT_TOLERANCE {
                findings.push(Diagnostic::new(
                    Severity::Warning,
                    ids::GROSS_PROFIT,
                    Some(period.period_end),
                    format!("gross profit {gross} differs from revenue less cost of goods sold ({expected})"),
                ));
            }
        }

        if let Some(revenue) = revenue
            && revenue < 0.0
        {
            findings.push(Diagnostic::new(
                Severity::Warning,
                ids::REVENUES,
                Some(period.period_end),
                format!("negative revenue {revenue}"),
            ));
        }
    }

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LineItemCatalog;
    use crate::normalizer::StatementNormalizer;
    use crate::resolver::FieldResolver;
    use finmodel_core::{PeriodType, RawPeriod, RawStatement, Symbol};

    fn run(periods: Vec<RawPeriod>) -> Vec<Diagnostic> {
        let raw = RawStatement::new(Symbol::new("ACME"), PeriodType::Quarterly, periods);
        let catalog = LineItemCatalog::institutional();
        let mapping = FieldResolver::default().resolve_statement(&raw, catalog);
        let statement = StatementNormalizer::default()
            .normalize(&raw, &mapping, catalog)
            .unwrap();
        diagnose(&statement, &mapping)
    }

    #[test]
    fn test_consistent_statement_has_no_warnings() {
        let findings = run(vec![
            RawPeriod::new("2024-06-30")
                .with_field("revenues", 1000.0)
                .with_field("cost_of_revenue", 400.0)
                .with_field("gross_profit", 600.0)
                .with_field("net_income_loss", 100.0),
        ]);
        assert!(findings.iter().all(|d| d.severity == Severity::Info));
    }

    #[test]
    fn test_missing_key_items() {
        let findings = run(vec![RawPeriod::new("2024-06-30").with_field("gross_profit", 1.0)]);
        let missing: Vec<&str> = findings
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.line_item.as_str())
            .collect();
        assert_eq!(missing, vec![ids::REVENUES, ids::NET_INCOME]);
    }

    #[test]
    fn test_gross_profit_identity() {
        let findings = run(vec![
            RawPeriod::new("2024-06-30")
                .with_field("revenues", 1000.0)
                .with_field("cost_of_revenue", 400.0)
                .with_field("gross_profit", 650.0)
                .with_field("net_income_loss", 100.0),
        ]);
        let gross: Vec<&Diagnostic> = findings
            .iter()
            .filter(|d| d.line_item == ids::GROSS_PROFIT)
            .collect();
        assert_eq!(gross.len(), 1);
        assert_eq!(gross[0].severity, Severity::Warning);
        assert_eq!(gross[0].period_end, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn test_negative_revenue_and_partial_coverage() {
        let findings = run(vec![
            RawPeriod::new("2024-06-30")
                .with_field("revenues", -5.0)
                .with_field("net_income_loss", 1.0),
            RawPeriod::new("2024-03-31").with_field("revenues", 10.0),
        ]);
        assert!(findings
            .iter()
            .any(|d| d.line_item == ids::REVENUES && d.message.starts_with("negative revenue")));
        assert!(findings
            .iter()
            .any(|d| d.line_item == ids::NET_INCOME && d.message == "missing in 1 of 2 periods"));
    }

    #[test]
    fn test_keyword_match_reported() {
        let findings = run(vec![
            RawPeriod::new("2024-06-30")
                .with_field("revenues", 10.0)
                .with_field("net_income_loss", 1.0)
                .with_field("SellingGeneralAdminExpenses", 3.0),
        ]);
        let keyword = findings
            .iter()
            .find(|d| d.line_item == "SellingGeneralAndAdministrativeExpenses")
            .unwrap();
        assert_eq!(keyword.severity, Severity::Info);
        assert!(keyword.message.contains("SellingGeneralAdminExpenses"));
    }
}
