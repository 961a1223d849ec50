//! No-op cache implementation.

use async_trait::async_trait;
use finmodel_core::{PeriodType, RawStatement, Result, StatementCache, Symbol};
use std::time::Duration;
use tracing::trace;

/// A cache that stores nothing.
///
/// `get_raw` always misses and `put_raw` discards its input, so every request
/// goes to the provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

impl NoopCache {
    /// Create a new no-op cache.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StatementCache for NoopCache {
    async fn get_raw(
        &self,
        _provider: &str,
        _symbol: &Symbol,
        _period_type: PeriodType,
    ) -> Result<Option<RawStatement>> {
        trace!("NoopCache: get_raw called, returning None");
        Ok(None)
    }

    async fn put_raw(&self, _provider: &str, _statement: &RawStatement) -> Result<()> {
        trace!("NoopCache: put_raw called, doing nothing");
        Ok(())
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        Ok(0)
    }

    async fn clear(&self) -> Result<()> {
        Ok(())
    }
}
