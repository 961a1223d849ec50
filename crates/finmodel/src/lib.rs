#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finmodel/finmodel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Income-statement generation from provider data.
//!
//! This crate re-exports the workspace crates and provides
//! [`StatementPipeline`], which runs fetch, resolution, normalization and
//! diagnostics for one or more tickers.
//!
//! # Features
//!
//! - `polygon` - Polygon.io provider
//! - `cache-sqlite` - SQLite-based caching

/// End-to-end statement generation.
pub mod pipeline;

// Core types and traits
pub use finmodel_core::*;

// Mapping and normalization
pub use finmodel_mapping::{
    AnnualSummary, CanonicalPeriod, CanonicalStatement, Confidence, Diagnostic, FieldMapping,
    FieldResolution, FieldResolver, KEY_LINE_ITEMS, KeyFigures, KeyMetricSummary, LineItem,
    LineItemCatalog, LineItemLabel, LineItemValue, MatchStrategy, PeriodMetrics, Severity,
    StatementNormalizer, annual_summaries, diagnose, key_metrics,
};

// Output
pub use finmodel_report::{
    AnalysisLayout, AnalysisRenderer, CsvRenderer, ParquetRenderer, ProvenanceRenderer,
    StatementRenderer, display_frame, provenance_frame, statement_frame,
};

// Cache implementations
#[cfg(feature = "cache-sqlite")]
pub use finmodel_cache::SqliteCache;
pub use finmodel_cache::{InMemoryCache, NoopCache};

// Providers
#[cfg(feature = "polygon")]
pub use finmodel_polygon::{PolygonConfig, PolygonProvider};

pub use pipeline::{FieldInspection, PipelineOptions, StatementPipeline, StatementReport};
