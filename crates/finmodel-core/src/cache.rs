//! Cache trait for storing raw provider responses.
//!
//! This module defines the [`StatementCache`] trait. Only raw responses are
//! cached: a field mapping is rebuilt for every request because field sets
//! differ between companies and drift over time.

use async_trait::async_trait;
use std::time::Duration;

use crate::{
    error::Result,
    frequency::PeriodType,
    types::{RawStatement, Symbol},
};

/// Trait for caching raw provider responses.
///
/// Implementations can store data in various backends (SQLite, in-memory, etc.)
/// to avoid repeated API calls.
#[async_trait]
pub trait StatementCache: Send + Sync {
    /// Retrieves a cached raw statement.
    ///
    /// Returns `Ok(Some(statement))` if cached, `Ok(None)` if not cached.
    async fn get_raw(
        &self,
        provider: &str,
        symbol: &Symbol,
        period_type: PeriodType,
    ) -> Result<Option<RawStatement>>;

    /// Stores a raw statement, replacing any previous entry for the same key.
    async fn put_raw(&self, provider: &str, statement: &RawStatement) -> Result<()>;

    /// Removes cache entries older than the specified TTL.
    ///
    /// Returns the number of entries invalidated.
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize>;

    /// Clears all cached data.
    async fn clear(&self) -> Result<()>;
}
