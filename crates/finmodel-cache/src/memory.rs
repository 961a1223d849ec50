//! In-memory cache implementation.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use finmodel_core::{PeriodType, RawStatement, Result, StatementCache, Symbol};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
struct CacheEntry {
    statement: RawStatement,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(statement: RawStatement) -> Self {
        Self {
            statement,
            cached_at: Utc::now(),
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(self.cached_at);
        age > TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StatementKey {
    provider: String,
    symbol: Symbol,
    period_type: PeriodType,
}

impl StatementKey {
    fn new(provider: &str, symbol: &Symbol, period_type: PeriodType) -> Self {
        Self {
            provider: provider.to_string(),
            symbol: symbol.clone(),
            period_type,
        }
    }
}

/// Process-local cache of raw statements.
///
/// Entries live in a `RwLock`-protected `HashMap` and are lost when the cache
/// is dropped. Statements are cloned on get and put.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    statements: RwLock<HashMap<StatementKey, CacheEntry>>,
}

impl InMemoryCache {
    /// Create a new empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached statements.
    pub async fn len(&self) -> usize {
        self.statements.read().await.len()
    }

    /// Returns true if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.statements.read().await.is_empty()
    }
}

#[async_trait]
impl StatementCache for InMemoryCache {
    #[instrument(skip(self), fields(provider = %provider, symbol = %symbol))]
    async fn get_raw(
        &self,
        provider: &str,
        symbol: &Symbol,
        period_type: PeriodType,
    ) -> Result<Option<RawStatement>> {
        let key = StatementKey::new(provider, symbol, period_type);
        let cache = self.statements.read().await;
        match cache.get(&key) {
            Some(entry) => {
                debug!("Cache hit for raw statement");
                Ok(Some(entry.statement.clone()))
            }
            None => {
                debug!("Cache miss for raw statement");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, statement), fields(provider = %provider, symbol = %statement.symbol, periods = statement.periods.len()))]
    async fn put_raw(&self, provider: &str, statement: &RawStatement) -> Result<()> {
        let key = StatementKey::new(provider, &statement.symbol, statement.period_type);
        self.statements
            .write()
            .await
            .insert(key, CacheEntry::new(statement.clone()));
        debug!("Cached raw statement");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let mut cache = self.statements.write().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_stale(ttl));
        let removed = before - cache.len();
        if removed > 0 {
            debug!("Invalidated {} stale cache entries", removed);
        }
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        self.statements.write().await.clear();
        debug!("Cleared all cache entries");
        Ok(())
    }
}
