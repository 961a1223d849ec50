#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finmodel/finmodel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for income-statement normalization.
//!
//! This crate provides the foundational abstractions shared by the workspace:
//!
//! - [`StatementProvider`](provider::StatementProvider) - Fetches raw income-statement periods
//! - [`StatementCache`](cache::StatementCache) - Caching abstraction for raw provider responses
//! - [`RawStatement`](types::RawStatement) - Provider response with untouched field names
//! - [`StatementError`](error::StatementError) - Error taxonomy

/// Cache trait for storing raw provider responses.
pub mod cache;
/// Error types for fetch and normalization operations.
pub mod error;
/// Reporting period granularity.
pub mod frequency;
/// Provider trait for fetching raw income statements.
pub mod provider;
/// Core data types (Symbol, RawValue, RawPeriod, RawStatement).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::StatementCache;
pub use error::{Result, StatementError};
pub use frequency::PeriodType;
pub use provider::StatementProvider;
pub use types::{RawPeriod, RawStatement, RawValue, Symbol};
