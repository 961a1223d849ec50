#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finmodel/finmodel/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Polygon.io income-statement provider.
//!
//! This crate implements [`StatementProvider`] for the
//! [Polygon.io](https://polygon.io/) financials API.

use async_trait::async_trait;
use finmodel_core::{PeriodType, Result, StatementError, StatementProvider, Symbol};
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

mod config;
mod response;

pub use config::{API_KEY_ENV, DEFAULT_BASE_URL, PolygonConfig};

use response::FinancialsResponse;

const PROVIDER_NAME: &str = "Polygon";

/// Largest page size the financials endpoint accepts.
const MAX_LIMIT: usize = 100;

/// Polygon.io income-statement provider.
#[derive(Clone)]
pub struct PolygonProvider {
    client: Client,
    api_key: String,
    config: PolygonConfig,
}

impl fmt::Debug for PolygonProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolygonProvider")
            .field("api_key", &"[REDACTED]")
            .field("config", &self.config)
            .finish()
    }
}

impl PolygonProvider {
    /// Creates a provider with the default configuration.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(api_key, PolygonConfig::default())
    }

    /// Creates a provider with a custom configuration.
    #[must_use]
    pub fn with_config(api_key: impl Into<String>, config: PolygonConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            config,
        }
    }

    /// Creates a provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>, config: PolygonConfig) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            config,
        }
    }

    /// Creates a provider from the `POLYGON_API_KEY` environment variable.
    ///
    /// # Errors
    /// Returns [`StatementError::ProviderNotConfigured`] if the variable is
    /// unset or blank.
    pub fn from_env() -> Result<Self> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key.trim())),
            _ => Err(StatementError::ProviderNotConfigured(format!(
                "{API_KEY_ENV} is not set"
            ))),
        }
    }

    /// Returns the transport configuration.
    #[must_use]
    pub fn config(&self) -> &PolygonConfig {
        &self.config
    }

    /// Builds the financials URL, API key included. Query values are
    /// form-encoded.
    fn url(&self, symbol: &Symbol, period_type: PeriodType, limit: usize) -> Result<Url> {
        let endpoint = format!(
            "{}/vX/reference/financials",
            self.config.base_url.trim_end_matches('/')
        );
        let limit = limit.clamp(1, MAX_LIMIT).to_string();
        Url::parse_with_params(
            &endpoint,
            [
                ("ticker", symbol.as_str()),
                ("timeframe", period_type.as_str()),
                ("limit", limit.as_str()),
                ("apiKey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| StatementError::InvalidParameter(format!("Invalid request URL: {e}")))
    }

    /// One GET attempt, bounded by the configured timeout.
    async fn get_once(&self, url: &Url) -> Result<String> {
        let started = Instant::now();
        let request = async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| StatementError::Network(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);
                let text = response.text().await.unwrap_or_default();
                return Err(status_error(status, retry_after, &text));
            }

            response
                .text()
                .await
                .map_err(|e| StatementError::Network(e.to_string()))
        };

        tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| StatementError::Timeout {
                provider: PROVIDER_NAME.to_string(),
                elapsed: started.elapsed(),
            })?
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error or
    /// the retry budget is spent.
    async fn with_retries<T, F, Fut>(&self, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut retry = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retry < self.config.max_retries => {
                    let delay = match &e {
                        StatementError::RateLimited {
                            retry_after: Some(after),
                            ..
                        } => (*after).max(self.config.backoff(retry)),
                        _ => self.config.backoff(retry),
                    };
                    warn!(
                        provider = PROVIDER_NAME,
                        retry = retry + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying request"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Maps a non-success HTTP status to an error.
fn status_error(status: StatusCode, retry_after: Option<Duration>, body: &str) -> StatementError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => StatementError::RateLimited {
            provider: PROVIDER_NAME.to_string(),
            retry_after,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StatementError::AuthenticationFailed(format!("HTTP {status}: {body}"))
        }
        StatusCode::NOT_FOUND => StatementError::SymbolNotFound(format!("HTTP {status}: {body}")),
        s if s.is_server_error() => StatementError::Network(format!("HTTP {status}: {body}")),
        _ => StatementError::Other(format!("HTTP {status}: {body}")),
    }
}

#[async_trait]
impl StatementProvider for PolygonProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Polygon.io financials (vX/reference/financials)"
    }

    #[instrument(skip(self, symbol), fields(provider = PROVIDER_NAME, symbol = %symbol))]
    async fn fetch_income_statement(
        &self,
        symbol: &Symbol,
        period_type: PeriodType,
        limit: usize,
    ) -> Result<finmodel_core::RawStatement> {
        if symbol.is_empty() {
            return Err(StatementError::InvalidParameter(
                "Ticker must not be empty".to_string(),
            ));
        }

        let url = self.url(symbol, period_type, limit)?;
        debug!(%period_type, limit, "Polygon financials request");

        let text = self.with_retries(|| self.get_once(&url)).await?;
        let response: FinancialsResponse =
            serde_json::from_str(&text).map_err(|e| StatementError::Parse(e.to_string()))?;

        if let Some(message) = response.error_message() {
            return Err(StatementError::Other(format!("Polygon error: {message}")));
        }

        let statement = response.into_raw_statement(symbol, period_type);
        debug!(periods = statement.periods.len(), "Polygon financials received");
        Ok(statement)
    }
}
