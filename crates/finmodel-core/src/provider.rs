//! Provider trait for fetching raw income statements.
//!
//! The normalization core never talks to the network itself. It consumes a
//! [`StatementProvider`], which hides transport, authentication, retries and
//! timeouts behind a single "fetch periods for ticker" call.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    frequency::PeriodType,
    types::{RawStatement, Symbol},
};

/// Provider of raw income-statement periods.
///
/// Implementations return periods with the provider's own field names; any
/// renaming is left to the field resolver.
#[async_trait]
pub trait StatementProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "Polygon").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;

    /// Fetches raw income-statement periods for a symbol.
    ///
    /// # Arguments
    ///
    /// * `symbol` - The stock symbol
    /// * `period_type` - Quarterly or Annual
    /// * `limit` - Maximum number of periods to request (most recent first)
    ///
    /// An empty period list is a valid answer; deciding whether that is fatal
    /// is up to the caller.
    async fn fetch_income_statement(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: usize,
    ) -> Result<RawStatement>;
}
