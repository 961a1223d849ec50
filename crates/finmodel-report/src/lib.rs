#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finmodel/finmodel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// DataFrame layouts of a canonical statement.
pub mod frame;
/// Output renderers.
pub mod render;

pub use frame::{
    DERIVED_ROWS, GROWTH_ROWS, LINE_ITEM_COLUMN, MISSING_IN_PERIOD, NOT_AVAILABLE, annual_frame,
    display_frame, growth_frame, key_metrics_frame, provenance_frame, statement_frame,
};
pub use render::{
    AnalysisLayout, AnalysisRenderer, CsvRenderer, ParquetRenderer, ProvenanceRenderer,
    StatementRenderer,
};
