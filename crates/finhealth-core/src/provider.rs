//! Provider trait for fetching company financial data.
//!
//! This module defines [`FinancialDataProvider`], the contract every data
//! source must satisfy: resolve a ticker to a [`CompanyIdentity`] and fetch
//! N years of [`PeriodStatement`]s.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    types::{CompanyIdentity, PeriodStatement, Ticker},
};

/// Contract for a financial data source.
///
/// Providers are tried in priority order by the orchestration service, so
/// implementations must fail with a [`ProviderError`](crate::ProviderError)
/// rather than silently returning partial results: absence of data is
/// expressed via optional fields inside a validly-shaped object, never via
/// omission of the whole result.
#[async_trait]
pub trait FinancialDataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;

    /// Resolves a ticker to company identity metadata.
    ///
    /// Fails with [`ProviderError`](crate::ProviderError) if the ticker
    /// cannot be mapped to this source's registry.
    async fn resolve_identity(&self, ticker: &Ticker) -> Result<CompanyIdentity>;

    /// Fetches up to `num_years` annual statements, most recent first.
    ///
    /// Fails with [`ProviderError`](crate::ProviderError) if no usable
    /// statement can be constructed; an empty list is never returned.
    async fn fetch_statements(
        &self,
        ticker: &Ticker,
        num_years: usize,
    ) -> Result<Vec<PeriodStatement>>;
}
