//! Error types for data acquisition.
//!
//! This module defines [`ProviderError`], which covers every way a single
//! provider can fail to produce usable data, and [`ServiceError`], raised by
//! the orchestration layer once every configured provider has failed.

use thiserror::Error;

use crate::types::Ticker;

/// Errors that can occur while a single provider resolves identity or
/// fetches statements.
///
/// Field-level gaps are never errors: a provider that can construct at least
/// one validly-shaped statement returns it with absent fields left as `None`.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Network-related errors (connection failures, timeouts, HTTP status).
    #[error("Network error: {0}")]
    Network(String),

    /// Error parsing a provider's response payload.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The ticker could not be mapped to this source's registry.
    #[error("Ticker not found: {0}")]
    TickerNotFound(String),

    /// The provider returned an empty or structurally invalid payload.
    #[error("Empty or invalid payload from {provider} for {ticker}")]
    EmptyPayload {
        /// The provider that produced the payload.
        provider: String,
        /// The ticker that was requested.
        ticker: String,
    },

    /// No statement could be constructed after aggregation.
    ///
    /// A provider must fail with this rather than return an empty list.
    #[error("No statements could be constructed for {0}")]
    NoStatements(String),

    /// Error interacting with the response cache.
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Errors raised by the orchestration service.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Every configured provider failed to produce statements.
    ///
    /// Chains the last underlying [`ProviderError`] for diagnostics.
    #[error("All providers failed to return financial statements for {ticker}")]
    AllProvidersFailed {
        /// The ticker that was requested.
        ticker: Ticker,
        /// The last provider failure observed during fallback.
        #[source]
        last_error: ProviderError,
    },

    /// The service was constructed without any providers.
    #[error("No providers configured")]
    NoProviders,
}

/// Result type alias using [`ProviderError`].
pub type Result<T, E = ProviderError> = std::result::Result<T, E>;
