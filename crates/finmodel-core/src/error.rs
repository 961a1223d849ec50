//! Error types for fetch and normalization operations.
//!
//! This module defines [`StatementError`]. Only conditions that make a whole
//! request unusable are errors; a line item the provider does not report, or
//! a single malformed cell, is carried as a null value with a note instead.

use thiserror::Error;

/// Errors that can occur while fetching or normalizing income statements.
#[derive(Error, Debug)]
pub enum StatementError {
    /// No raw periods were supplied to the normalizer.
    #[error("No raw periods supplied for {0}")]
    EmptyInput(String),

    /// Network-related errors (connection failures, non-success status, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// A provider request exceeded its hard timeout.
    #[error("Request to {provider} timed out after {elapsed:?}")]
    Timeout {
        /// The provider that did not answer in time.
        provider: String,
        /// The configured timeout.
        elapsed: std::time::Duration,
    },

    /// The requested symbol was not found.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Error parsing data from a provider or a catalog file.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The requested provider is not configured.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Authentication failed for a provider.
    #[error("Authentication failed for provider {0}")]
    AuthenticationFailed(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl StatementError {
    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::RateLimited { .. } | Self::Timeout { .. }
        )
    }
}

/// Result type alias using [`StatementError`].
pub type Result<T> = std::result::Result<T, StatementError>;
