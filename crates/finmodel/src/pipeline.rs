//! Fetch, resolve, normalize and diagnose in one call.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use finmodel_core::{
    PeriodType, RawStatement, Result, StatementCache, StatementError, StatementProvider, Symbol,
};
use finmodel_mapping::{
    CanonicalStatement, Diagnostic, FieldMapping, FieldResolver, LineItemCatalog,
    StatementNormalizer, diagnose, normalizer::DEFAULT_PERIOD_LIMIT,
};

/// Request settings shared by every ticker a pipeline processes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Quarterly or annual periods.
    pub period_type: PeriodType,
    /// Maximum number of periods in the output.
    pub period_limit: usize,
    /// Cached responses older than this are discarded before lookup.
    pub cache_ttl: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            period_type: PeriodType::Quarterly,
            period_limit: DEFAULT_PERIOD_LIMIT,
            cache_ttl: None,
        }
    }
}

impl PipelineOptions {
    /// Sets the period type.
    #[must_use]
    pub const fn with_period_type(mut self, period_type: PeriodType) -> Self {
        self.period_type = period_type;
        self
    }

    /// Sets the period limit.
    #[must_use]
    pub const fn with_period_limit(mut self, limit: usize) -> Self {
        self.period_limit = limit;
        self
    }

    /// Sets the cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }
}

/// Output of [`StatementPipeline::generate`].
#[derive(Clone, Debug, Serialize)]
pub struct StatementReport {
    /// The normalized statement.
    pub statement: CanonicalStatement,
    /// The mapping the statement was built with.
    pub mapping: FieldMapping,
    /// Non-gating findings.
    pub diagnostics: Vec<Diagnostic>,
    /// True if the raw data came from the cache.
    pub from_cache: bool,
}

/// Output of [`StatementPipeline::inspect`].
#[derive(Clone, Debug, Serialize)]
pub struct FieldInspection {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Number of raw periods returned.
    pub period_count: usize,
    /// Field names of the most complete period.
    pub raw_fields: Vec<String>,
    /// Period-end date of the most complete period.
    pub sample_period_end: Option<String>,
    /// Mapping resolved against those fields.
    pub mapping: FieldMapping,
}

/// Wires a provider, an optional cache and the line-item catalog together.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use finmodel::{PolygonProvider, StatementPipeline, Symbol};
///
/// let pipeline = StatementPipeline::new(Arc::new(PolygonProvider::from_env()?));
/// let report = pipeline.generate(&Symbol::new("AAPL")).await?;
/// println!("{} periods", report.statement.periods.len());
/// ```
#[derive(Clone)]
pub struct StatementPipeline {
    provider: Arc<dyn StatementProvider>,
    cache: Option<Arc<dyn StatementCache>>,
    catalog: Arc<LineItemCatalog>,
    resolver: FieldResolver,
    options: PipelineOptions,
}

impl std::fmt::Debug for StatementPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementPipeline")
            .field("provider", &self.provider.name())
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .field("catalog_items", &self.catalog.len())
            .field("options", &self.options)
            .finish()
    }
}

impl StatementPipeline {
    /// Creates a pipeline using the institutional catalog and default options.
    #[must_use]
    pub fn new(provider: Arc<dyn StatementProvider>) -> Self {
        Self {
            provider,
            cache: None,
            catalog: Arc::new(LineItemCatalog::institutional().clone()),
            resolver: FieldResolver::default(),
            options: PipelineOptions::default(),
        }
    }

    /// Sets the cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn StatementCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Replaces the line-item catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: LineItemCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Replaces the field resolver.
    #[must_use]
    pub const fn with_resolver(mut self, resolver: FieldResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the request options.
    #[must_use]
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the request options.
    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Returns the line-item catalog.
    #[must_use]
    pub fn catalog(&self) -> &LineItemCatalog {
        &self.catalog
    }

    /// Builds the normalized statement for one ticker.
    ///
    /// # Errors
    /// Provider errors propagate. A provider answer without periods is
    /// [`StatementError::EmptyInput`]. A statement whose periods were all
    /// undated is returned as an empty statement, not an error.
    #[instrument(skip(self, symbol), fields(provider = %self.provider.name(), symbol = %symbol))]
    pub async fn generate(&self, symbol: &Symbol) -> Result<StatementReport> {
        let (raw, from_cache) = self.fetch_raw(symbol).await?;

        let mapping = self.resolver.resolve_statement(&raw, &self.catalog);
        let statement = StatementNormalizer::new(self.options.period_limit)
            .normalize(&raw, &mapping, &self.catalog)?;
        let diagnostics = diagnose(&statement, &mapping);

        for diagnostic in &diagnostics {
            debug!(%diagnostic, "Statement diagnostic");
        }
        info!(
            periods = statement.periods.len(),
            resolved = mapping.resolved_count(),
            unresolved = mapping.len() - mapping.resolved_count(),
            diagnostics = diagnostics.len(),
            from_cache,
            "Generated income statement"
        );

        Ok(StatementReport {
            statement,
            mapping,
            diagnostics,
            from_cache,
        })
    }

    /// Builds statements for several tickers concurrently.
    ///
    /// Results are returned in input order; one ticker failing does not
    /// affect the others.
    pub async fn generate_many(&self, symbols: &[Symbol]) -> Vec<(Symbol, Result<StatementReport>)> {
        let reports = join_all(symbols.iter().map(|symbol| self.generate(symbol))).await;
        symbols.iter().cloned().zip(reports).collect()
    }

    /// Lists the raw fields of the most complete period and the mapping
    /// resolved against them.
    ///
    /// # Errors
    /// Provider errors propagate.
    #[instrument(skip(self, symbol), fields(provider = %self.provider.name(), symbol = %symbol))]
    pub async fn inspect(&self, symbol: &Symbol) -> Result<FieldInspection> {
        let (raw, _) = self.fetch_raw(symbol).await?;
        let sample = raw.representative_period();

        Ok(FieldInspection {
            symbol: raw.symbol.clone(),
            period_count: raw.periods.len(),
            raw_fields: sample
                .map(|p| p.field_names().map(str::to_string).collect())
                .unwrap_or_default(),
            sample_period_end: sample.and_then(|p| p.period_end.clone()),
            mapping: self.resolver.resolve_statement(&raw, &self.catalog),
        })
    }

    /// Fetches raw periods, consulting the cache first.
    async fn fetch_raw(&self, symbol: &Symbol) -> Result<(RawStatement, bool)> {
        if symbol.is_empty() {
            return Err(StatementError::InvalidParameter(
                "Ticker must not be empty".to_string(),
            ));
        }
        if self.options.period_limit == 0 {
            return Err(StatementError::InvalidParameter(
                "Period limit must be at least 1".to_string(),
            ));
        }

        let provider = self.provider.name();
        let period_type = self.options.period_type;

        if let Some(cache) = &self.cache {
            if let Some(ttl) = self.options.cache_ttl
                && let Err(e) = cache.invalidate_stale(ttl).await
            {
                warn!(provider, error = %e, "Failed to invalidate stale cache entries");
            }

            match cache.get_raw(provider, symbol, period_type).await {
                Ok(Some(raw)) if !raw.is_empty() => {
                    debug!(provider, "Using cached raw statement");
                    return Ok((raw, true));
                }
                Ok(_) => {}
                Err(e) => warn!(provider, error = %e, "Cache lookup failed"),
            }
        }

        debug!(provider, %period_type, "Fetching raw statement");
        let raw = self
            .provider
            .fetch_income_statement(symbol, period_type, self.options.period_limit)
            .await?;

        if let Some(cache) = &self.cache
            && !raw.is_empty()
            && let Err(e) = cache.put_raw(provider, &raw).await
        {
            warn!(provider, error = %e, "Failed to cache raw statement");
        }

        Ok((raw, false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use finmodel_cache::InMemoryCache;
    use finmodel_core::RawPeriod;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct StubProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatementProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        fn description(&self) -> &str {
            "Fixed responses for tests"
        }

        async fn fetch_income_statement(
            &self,
            symbol: &Symbol,
            period_type: PeriodType,
            _limit: usize,
        ) -> Result<RawStatement> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let periods = match symbol.as_str() {
                "EMPTY" => Vec::new(),
                "FAIL" => return Err(StatementError::SymbolNotFound(symbol.to_string())),
                _ => vec![
                    RawPeriod::new("2024-06-30")
                        .with_field("revenues", 1000.0)
                        .with_field("cost_of_revenue", 400.0)
                        .with_field("research_and_development", 100.0),
                    RawPeriod::new("2024-03-31").with_field("revenues", 900.0),
                ],
            };
            Ok(RawStatement::new(symbol.clone(), period_type, periods).with_company_name("Acme Corp"))
        }
    }

    #[tokio::test]
    async fn test_generate_report() {
        let pipeline = StatementPipeline::new(Arc::new(StubProvider::default()));
        let report = pipeline.generate(&Symbol::new("acme")).await.unwrap();

        assert!(!report.from_cache);
        assert_eq!(report.statement.company_name, "Acme Corp");
        assert_eq!(report.statement.periods.len(), 2);
        assert_eq!(report.statement.periods[0].value("Revenues"), Some(1000.0));
        assert_eq!(report.mapping.resolved_count(), 3);
        assert!(
            report
                .diagnostics
                .iter()
                .any(|d| d.line_item == "NetIncomeLoss")
        );
    }

    #[tokio::test]
    async fn test_cache_hit_skips_provider() {
        let provider = Arc::new(StubProvider::default());
        let pipeline = StatementPipeline::new(provider.clone())
            .with_cache(Arc::new(InMemoryCache::new()))
            .with_options(PipelineOptions::default().with_cache_ttl(Duration::from_secs(3600)));
        let symbol = Symbol::new("ACME");

        let first = pipeline.generate(&symbol).await.unwrap();
        let second = pipeline.generate(&symbol).await.unwrap();

        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            serde_json::to_string(&first.statement).unwrap(),
            serde_json::to_string(&second.statement).unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_provider_answer_is_empty_input() {
        let provider = Arc::new(StubProvider::default());
        let pipeline =
            StatementPipeline::new(provider.clone()).with_cache(Arc::new(InMemoryCache::new()));

        let result = pipeline.generate(&Symbol::new("EMPTY")).await;
        assert!(matches!(result, Err(StatementError::EmptyInput(_))));

        // Empty answers are not cached
        let _ = pipeline.generate(&Symbol::new("EMPTY")).await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_generate_many_keeps_order_and_isolates_failures() {
        let pipeline = StatementPipeline::new(Arc::new(StubProvider::default()))
            .with_options(PipelineOptions::default().with_period_type(PeriodType::Annual));
        let symbols = vec![Symbol::new("ACME"), Symbol::new("FAIL"), Symbol::new("INIT")];

        let results = pipeline.generate_many(&symbols).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, symbols[0]);
        assert!(results[0].1.is_ok());
        assert!(matches!(results[1].1, Err(StatementError::SymbolNotFound(_))));
        assert_eq!(
            results[2].1.as_ref().unwrap().statement.period_type,
            PeriodType::Annual
        );
    }

    #[tokio::test]
    async fn test_inspect_lists_fields() {
        let pipeline = StatementPipeline::new(Arc::new(StubProvider::default()));
        let inspection = pipeline.inspect(&Symbol::new("ACME")).await.unwrap();
        assert_eq!(inspection.period_count, 2);
        assert_eq!(
            inspection.raw_fields,
            vec!["cost_of_revenue", "research_and_development", "revenues"]
        );
        assert_eq!(inspection.sample_period_end.as_deref(), Some("2024-06-30"));
        assert_eq!(inspection.mapping.len(), pipeline.catalog().len());
    }

    #[tokio::test]
    async fn test_invalid_limit_and_symbol() {
        let pipeline = StatementPipeline::new(Arc::new(StubProvider::default()))
            .with_options(PipelineOptions::default().with_period_limit(0));
        assert!(matches!(
            pipeline.generate(&Symbol::new("ACME")).await,
            Err(StatementError::InvalidParameter(_))
        ));
        assert!(matches!(
            pipeline.inspect(&Symbol::new(" ")).await,
            Err(StatementError::InvalidParameter(_))
        ));
    }
}
