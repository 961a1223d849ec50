//! SQLite-based cache implementation.

use async_trait::async_trait;
use chrono::Utc;
use finmodel_core::{PeriodType, RawStatement, Result, StatementCache, StatementError, Symbol};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, instrument};

/// SQLite-based cache for raw statements.
///
/// Each (provider, ticker, period type) key holds one JSON-encoded
/// [`RawStatement`] and the time it was written, so cached responses survive
/// restarts.
#[derive(Debug)]
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Opens (or creates) a cache database at the given path.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or schema creation fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| StatementError::Cache(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Creates an in-memory SQLite cache.
    ///
    /// # Errors
    /// Returns an error if schema creation fails.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| StatementError::Cache(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let cache = Self {
            conn: Mutex::new(conn),
        };
        cache.initialize_schema()?;
        Ok(cache)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StatementError::Cache(e.to_string()))
    }

    fn initialize_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS raw_statements (
                provider TEXT NOT NULL,
                symbol TEXT NOT NULL,
                period_type TEXT NOT NULL,
                data_json TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (provider, symbol, period_type)
            )",
            [],
        )
        .map_err(|e| StatementError::Cache(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_raw_statements_cached_at
             ON raw_statements(cached_at)",
            [],
        )
        .map_err(|e| StatementError::Cache(e.to_string()))?;

        debug!("SQLite cache schema initialized");
        Ok(())
    }

    const fn period_type_to_str(pt: PeriodType) -> &'static str {
        match pt {
            PeriodType::Annual => "A",
            PeriodType::Quarterly => "Q",
        }
    }
}

#[async_trait]
impl StatementCache for SqliteCache {
    #[instrument(skip(self), fields(provider = %provider, symbol = %symbol))]
    async fn get_raw(
        &self,
        provider: &str,
        symbol: &Symbol,
        period_type: PeriodType,
    ) -> Result<Option<RawStatement>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row(
                "SELECT data_json FROM raw_statements
                 WHERE provider = ?1 AND symbol = ?2 AND period_type = ?3",
                params![
                    provider,
                    symbol.as_str(),
                    Self::period_type_to_str(period_type)
                ],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StatementError::Cache(e.to_string()))?;

        match json {
            Some(json) => {
                let statement: RawStatement =
                    serde_json::from_str(&json).map_err(|e| StatementError::Parse(e.to_string()))?;
                debug!(periods = statement.periods.len(), "Cache hit for raw statement");
                Ok(Some(statement))
            }
            None => {
                debug!("Cache miss for raw statement");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, statement), fields(provider = %provider, symbol = %statement.symbol, periods = statement.periods.len()))]
    async fn put_raw(&self, provider: &str, statement: &RawStatement) -> Result<()> {
        let data_json =
            serde_json::to_string(statement).map_err(|e| StatementError::Parse(e.to_string()))?;
        let cached_at = Utc::now().to_rfc3339();

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO raw_statements
             (provider, symbol, period_type, data_json, cached_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                provider,
                statement.symbol.as_str(),
                Self::period_type_to_str(statement.period_type),
                data_json,
                cached_at
            ],
        )
        .map_err(|e| StatementError::Cache(e.to_string()))?;

        debug!("Cached raw statement");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn invalidate_stale(&self, ttl: Duration) -> Result<usize> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl)
                .map_err(|e| StatementError::Cache(format!("Invalid TTL duration: {e}")))?;

        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM raw_statements WHERE cached_at < ?1",
                params![cutoff.to_rfc3339()],
            )
            .map_err(|e| StatementError::Cache(e.to_string()))?;

        if deleted > 0 {
            debug!("Invalidated {} stale cache entries", deleted);
        }
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM raw_statements", [])
            .map_err(|e| StatementError::Cache(e.to_string()))?;
        debug!("Cleared all cache entries");
        Ok(())
    }
}
