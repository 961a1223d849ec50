//! Statement renderers.

use finmodel_core::{Result, StatementError};
use finmodel_mapping::CanonicalStatement;
use polars::prelude::*;
use std::io::Write;
use tracing::debug;

use crate::frame::{
    NOT_AVAILABLE, annual_frame, display_frame, growth_frame, key_metrics_frame,
    provenance_frame, statement_frame,
};

/// Writes a canonical statement in some output format.
pub trait StatementRenderer: Send + Sync + std::fmt::Debug {
    /// File extension of the output, without the dot.
    fn extension(&self) -> &'static str;

    /// Renders the statement into `out`.
    ///
    /// # Errors
    /// Returns an error if the layout cannot be built or written.
    fn render(&self, statement: &CanonicalStatement, out: &mut dyn Write) -> Result<()>;
}

/// CSV output of [`display_frame`]: absent cells carry a text marker.
#[derive(Debug, Clone, Copy)]
pub struct CsvRenderer {
    separator: u8,
}

impl Default for CsvRenderer {
    fn default() -> Self {
        Self { separator: b',' }
    }
}

impl CsvRenderer {
    /// Creates a comma-separated renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field separator.
    #[must_use]
    pub const fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }
}

impl StatementRenderer for CsvRenderer {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, statement: &CanonicalStatement, out: &mut dyn Write) -> Result<()> {
        let mut df = display_frame(statement)?;
        CsvWriter::new(out)
            .include_header(true)
            .with_separator(self.separator)
            .finish(&mut df)
            .map_err(|e| StatementError::Other(format!("CSV write failed: {e}")))?;
        debug!(symbol = %statement.symbol, rows = df.height(), "Rendered CSV statement");
        Ok(())
    }
}

/// Parquet output of [`statement_frame`]. Absent cells are typed nulls.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetRenderer;

impl ParquetRenderer {
    /// Creates a Parquet renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StatementRenderer for ParquetRenderer {
    fn extension(&self) -> &'static str {
        "parquet"
    }

    fn render(&self, statement: &CanonicalStatement, out: &mut dyn Write) -> Result<()> {
        let mut df = statement_frame(statement)?;
        ParquetWriter::new(out)
            .finish(&mut df)
            .map_err(|e| StatementError::Other(format!("Parquet write failed: {e}")))?;
        debug!(symbol = %statement.symbol, rows = df.height(), "Rendered Parquet statement");
        Ok(())
    }
}

/// CSV output of [`provenance_frame`]: one row per period and line item.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProvenanceRenderer;

impl ProvenanceRenderer {
    /// Creates a provenance renderer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl StatementRenderer for ProvenanceRenderer {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, statement: &CanonicalStatement, out: &mut dyn Write) -> Result<()> {
        let mut df = provenance_frame(statement)?;
        CsvWriter::new(out)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| StatementError::Other(format!("CSV write failed: {e}")))?;
        debug!(symbol = %statement.symbol, rows = df.height(), "Rendered provenance");
        Ok(())
    }
}

/// Analysis layouts written by [`AnalysisRenderer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisLayout {
    /// Period-over-period growth, see [`growth_frame`].
    Growth,
    /// Calendar-year totals and growth, see [`annual_frame`].
    Annual,
    /// Latest, YoY, average and CAGR per key line item, see [`key_metrics_frame`].
    KeyMetrics,
}

impl AnalysisLayout {
    /// All layouts, in output order.
    pub const ALL: [Self; 3] = [Self::Growth, Self::Annual, Self::KeyMetrics];

    /// Short name, used as a file-name suffix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Growth => "growth",
            Self::Annual => "annual",
            Self::KeyMetrics => "key_metrics",
        }
    }
}

/// CSV output of one analysis layout. Null cells read `N/A`.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRenderer {
    layout: AnalysisLayout,
}

impl AnalysisRenderer {
    /// Creates a renderer for `layout`.
    #[must_use]
    pub const fn new(layout: AnalysisLayout) -> Self {
        Self { layout }
    }

    /// The rendered layout.
    #[must_use]
    pub const fn layout(&self) -> AnalysisLayout {
        self.layout
    }
}

impl StatementRenderer for AnalysisRenderer {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn render(&self, statement: &CanonicalStatement, out: &mut dyn Write) -> Result<()> {
        let mut df = match self.layout {
            AnalysisLayout::Growth => growth_frame(statement)?,
            AnalysisLayout::Annual => annual_frame(statement)?,
            AnalysisLayout::KeyMetrics => key_metrics_frame(statement)?,
        };
        CsvWriter::new(out)
            .include_header(true)
            .with_null_value(NOT_AVAILABLE.to_string())
            .finish(&mut df)
            .map_err(|e| StatementError::Other(format!("CSV write failed: {e}")))?;
        debug!(
            symbol = %statement.symbol,
            layout = self.layout.as_str(),
            rows = df.height(),
            "Rendered analysis"
        );
        Ok(())
    }
}
