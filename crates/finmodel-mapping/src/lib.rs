#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finmodel/finmodel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Field resolution and normalization for income-statement data.
//!
//! Control flow for one request:
//!
//! 1. [`FieldResolver::resolve_statement`] picks the most complete raw period
//!    and maps every catalog line item to a raw field name (or to nothing).
//! 2. [`StatementNormalizer::normalize`] applies that mapping to every period
//!    and returns an immutable [`CanonicalStatement`].
//! 3. [`diagnose`] reports non-gating warnings about the result.
//! 4. [`annual_summaries`] and [`key_metrics`] summarize the key line items
//!    over the last three years.
//!
//! # Example
//!
//! ```
//! use finmodel_core::{PeriodType, RawPeriod, RawStatement, Symbol};
//! use finmodel_mapping::{FieldResolver, LineItemCatalog, StatementNormalizer};
//!
//! let raw = RawStatement::new(
//!     Symbol::new("ACME"),
//!     PeriodType::Quarterly,
//!     vec![
//!         RawPeriod::new("2024-06-30")
//!             .with_field("revenues", 1000.0)
//!             .with_field("cost_of_revenue", 400.0),
//!     ],
//! );
//!
//! let catalog = LineItemCatalog::institutional();
//! let mapping = FieldResolver::default().resolve_statement(&raw, catalog);
//! let statement = StatementNormalizer::default()
//!     .normalize(&raw, &mapping, catalog)
//!     .unwrap();
//!
//! assert_eq!(statement.periods[0].value("Revenues"), Some(1000.0));
//! assert_eq!(statement.periods[0].value("GrossProfit"), None);
//! ```

/// Calendar-year totals and three-year summaries of the key line items.
pub mod analysis;
/// Line-item catalog and the built-in institutional table.
pub mod catalog;
/// Canonical statement types.
pub mod canonical;
/// Non-gating consistency checks.
pub mod diagnostics;
/// Keyword extraction for fuzzy matching.
pub mod keywords;
/// Derived metrics (margins, per-share values, growth).
pub mod metrics;
/// Application of a field mapping across periods.
pub mod normalizer;
/// Layered field-name resolution.
pub mod resolver;

pub use analysis::{
    AnnualSummary, KEY_LINE_ITEMS, KeyFigures, KeyMetricSummary, annual_summaries, key_metrics,
};
pub use canonical::{CanonicalPeriod, CanonicalStatement, LineItemLabel, LineItemValue, PeriodMetrics};
pub use catalog::{LineItem, LineItemCatalog};
pub use diagnostics::{Diagnostic, Severity, diagnose};
pub use normalizer::{DEFAULT_PERIOD_LIMIT, StatementNormalizer};
pub use resolver::{Confidence, FieldMapping, FieldResolution, FieldResolver, MatchStrategy};
