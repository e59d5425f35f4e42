//! Orchestration service combining multiple providers with fallback and
//! enrichment behavior.

use std::sync::Arc;

use tracing::{debug, info, warn};

use finhealth_core::{
    CompanyIdentity, FinancialDataProvider, PeriodStatement, ProviderError, ServiceError, Ticker,
};

/// Service coordinating multiple financial data providers.
///
/// Providers are tried in registration order. Statement acquisition is
/// first-success-wins: the first provider that yields both an identity and
/// a non-empty statement history supplies the statements, and lower-priority
/// providers are not consulted for them. Identity metadata is then enriched
/// by querying every provider and filling in only the fields the primary
/// source left empty.
///
/// # Example
///
/// ```rust,ignore
/// use finhealth::{FinancialDataService, Ticker};
///
/// let service = FinancialDataService::new()
///     .with_edgar("MyApp/1.0 (contact@example.com)")
///     .with_yahoo();
///
/// let ticker = Ticker::new("AAPL");
/// let (identity, statements) = service.fetch_company_financials(&ticker, 5).await?;
/// ```
#[derive(Default)]
pub struct FinancialDataService {
    providers: Vec<Arc<dyn FinancialDataProvider>>,
}

impl std::fmt::Debug for FinancialDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinancialDataService")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl FinancialDataService {
    /// Create a new service with no providers registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider at the end of the priority order.
    pub fn register(&mut self, provider: Arc<dyn FinancialDataProvider>) {
        debug!(provider = provider.name(), "Registering provider");
        self.providers.push(provider);
    }

    /// Register a provider, builder-style.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn FinancialDataProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Names of the registered providers, in priority order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Fetch a company's identity and annual statement history.
    ///
    /// Tries providers in priority order until one yields statements, then
    /// enriches the identity with metadata from every registered provider.
    /// Individual provider failures are logged and do not abort the fetch;
    /// only exhausting the provider list is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NoProviders`] if no providers are registered,
    /// or [`ServiceError::AllProvidersFailed`] wrapping the last provider
    /// error if every provider fails.
    pub async fn fetch_company_financials(
        &self,
        ticker: &Ticker,
        num_years: usize,
    ) -> Result<(CompanyIdentity, Vec<PeriodStatement>), ServiceError> {
        if self.providers.is_empty() {
            return Err(ServiceError::NoProviders);
        }

        // Phase A: first provider to deliver statements wins.
        let mut primary: Option<(CompanyIdentity, Vec<PeriodStatement>)> = None;
        let mut last_error: Option<ProviderError> = None;

        for provider in &self.providers {
            debug!(
                provider = provider.name(),
                ticker = %ticker,
                "Fetching statements"
            );

            let identity = match provider.resolve_identity(ticker).await {
                Ok(identity) => identity,
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        ticker = %ticker,
                        error = %e,
                        "Identity resolution failed, trying next provider"
                    );
                    last_error = Some(e);
                    continue;
                }
            };

            match provider.fetch_statements(ticker, num_years).await {
                Ok(statements) => {
                    info!(
                        provider = provider.name(),
                        ticker = %ticker,
                        periods = statements.len(),
                        "Statements fetched"
                    );
                    primary = Some((identity, statements));
                    break;
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        ticker = %ticker,
                        error = %e,
                        "Statement fetch failed, trying next provider"
                    );
                    last_error = Some(e);
                }
            }
        }

        let Some((mut identity, statements)) = primary else {
            return Err(ServiceError::AllProvidersFailed {
                ticker: ticker.clone(),
                last_error: last_error
                    .unwrap_or_else(|| ProviderError::NoStatements(ticker.to_string())),
            });
        };

        // Phase B: enrich identity metadata from every provider. The winner
        // already populated its fields, so merging its own answer again is a
        // no-op; failures here are informational only.
        for provider in &self.providers {
            match provider.resolve_identity(ticker).await {
                Ok(candidate) => {
                    debug!(
                        provider = provider.name(),
                        ticker = %ticker,
                        "Merging identity metadata"
                    );
                    identity.merge_missing(&candidate);
                }
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        ticker = %ticker,
                        error = %e,
                        "Enrichment lookup failed, skipping"
                    );
                }
            }
        }

        Ok((identity, statements))
    }

    // Builder methods for easy setup with specific providers

    /// Add the SEC EDGAR provider.
    #[cfg(feature = "edgar")]
    #[must_use]
    pub fn with_edgar(mut self, user_agent: &str) -> Self {
        self.register(Arc::new(finhealth_edgar::EdgarProvider::new(user_agent)));
        self
    }

    /// Add the Yahoo Finance provider.
    #[cfg(feature = "yahoo")]
    #[must_use]
    pub fn with_yahoo(mut self) -> Self {
        self.register(Arc::new(finhealth_yahoo::YahooProvider::new()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use finhealth_core::{Period, Result};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn statement(source: &str) -> PeriodStatement {
        let mut stmt = PeriodStatement::new(
            Ticker::new("TEST"),
            Period::FullYear,
            2023,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            source,
        );
        stmt.income.revenue = Some(1_000.0);
        stmt
    }

    /// Stub provider with configurable identity and statement outcomes.
    #[derive(Debug)]
    struct StubProvider {
        name: &'static str,
        identity: Option<CompanyIdentity>,
        statements: Option<Vec<PeriodStatement>>,
        statement_calls: AtomicUsize,
    }

    impl StubProvider {
        fn working(name: &'static str, identity: CompanyIdentity) -> Self {
            Self {
                name,
                statements: Some(vec![statement(name)]),
                identity: Some(identity),
                statement_calls: AtomicUsize::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                name,
                identity: None,
                statements: None,
                statement_calls: AtomicUsize::new(0),
            }
        }

        /// Identity resolves but statement fetches fail.
        fn identity_only(name: &'static str, identity: CompanyIdentity) -> Self {
            Self {
                name,
                identity: Some(identity),
                statements: None,
                statement_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl FinancialDataProvider for StubProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Stub provider for tests"
        }

        async fn resolve_identity(&self, ticker: &Ticker) -> Result<CompanyIdentity> {
            self.identity
                .clone()
                .ok_or_else(|| ProviderError::TickerNotFound(ticker.to_string()))
        }

        async fn fetch_statements(
            &self,
            ticker: &Ticker,
            _num_years: usize,
        ) -> Result<Vec<PeriodStatement>> {
            self.statement_calls.fetch_add(1, Ordering::SeqCst);
            self.statements
                .clone()
                .ok_or_else(|| ProviderError::NoStatements(ticker.to_string()))
        }
    }

    fn identity_named(name: &str) -> CompanyIdentity {
        CompanyIdentity::new(Ticker::new("TEST")).with_name(name)
    }

    #[tokio::test]
    async fn test_no_providers_is_an_error() {
        let service = FinancialDataService::new();
        let result = service
            .fetch_company_financials(&Ticker::new("TEST"), 5)
            .await;

        assert!(matches!(result, Err(ServiceError::NoProviders)));
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let primary = Arc::new(StubProvider::working("primary", identity_named("Primary")));
        let backup = Arc::new(StubProvider::working("backup", identity_named("Backup")));

        let service = FinancialDataService::new()
            .with_provider(primary.clone())
            .with_provider(backup.clone());

        let (identity, statements) = service
            .fetch_company_financials(&Ticker::new("TEST"), 5)
            .await
            .unwrap();

        assert_eq!(identity.name.as_deref(), Some("Primary"));
        assert_eq!(statements[0].source, "primary");
        // The backup is never asked for statements once the primary delivers.
        assert_eq!(backup.statement_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_back_past_failing_provider() {
        let broken = Arc::new(StubProvider::failing("broken"));
        let backup = Arc::new(StubProvider::working("backup", identity_named("Backup")));

        let service = FinancialDataService::new()
            .with_provider(broken)
            .with_provider(backup);

        let (identity, statements) = service
            .fetch_company_financials(&Ticker::new("TEST"), 5)
            .await
            .unwrap();

        assert_eq!(identity.name.as_deref(), Some("Backup"));
        assert_eq!(statements.len(), 1);
        assert_eq!(statements[0].source, "backup");
    }

    #[tokio::test]
    async fn test_falls_back_when_statements_fail_after_identity() {
        let partial = Arc::new(StubProvider::identity_only(
            "partial",
            identity_named("Partial"),
        ));
        let backup = Arc::new(StubProvider::working("backup", identity_named("Backup")));

        let service = FinancialDataService::new()
            .with_provider(partial)
            .with_provider(backup);

        let (_, statements) = service
            .fetch_company_financials(&Ticker::new("TEST"), 5)
            .await
            .unwrap();

        assert_eq!(statements[0].source, "backup");
    }

    #[tokio::test]
    async fn test_all_providers_failing_chains_last_error() {
        let service = FinancialDataService::new()
            .with_provider(Arc::new(StubProvider::failing("first")))
            .with_provider(Arc::new(StubProvider::failing("second")));

        let result = service
            .fetch_company_financials(&Ticker::new("TEST"), 5)
            .await;

        match result {
            Err(ServiceError::AllProvidersFailed { ticker, last_error }) => {
                assert_eq!(ticker.as_str(), "TEST");
                assert!(matches!(last_error, ProviderError::TickerNotFound(_)));
            }
            other => panic!("expected AllProvidersFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_enrichment_fills_only_missing_fields() {
        let primary_identity = identity_named("Primary Co");
        let secondary_identity = CompanyIdentity::new(Ticker::new("TEST"))
            .with_name("Secondary Co")
            .with_sector("Technology")
            .with_website("https://example.com");

        let service = FinancialDataService::new()
            .with_provider(Arc::new(StubProvider::working("primary", primary_identity)))
            .with_provider(Arc::new(StubProvider::identity_only(
                "secondary",
                secondary_identity,
            )));

        let (identity, _) = service
            .fetch_company_financials(&Ticker::new("TEST"), 5)
            .await
            .unwrap();

        // Present fields keep the primary's values; gaps come from lower
        // priority providers.
        assert_eq!(identity.name.as_deref(), Some("Primary Co"));
        assert_eq!(identity.sector.as_deref(), Some("Technology"));
        assert_eq!(identity.website.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn test_enrichment_skips_failing_provider() {
        let service = FinancialDataService::new()
            .with_provider(Arc::new(StubProvider::working(
                "primary",
                identity_named("Primary Co"),
            )))
            .with_provider(Arc::new(StubProvider::failing("broken")));

        let (identity, statements) = service
            .fetch_company_financials(&Ticker::new("TEST"), 5)
            .await
            .unwrap();

        assert_eq!(identity.name.as_deref(), Some("Primary Co"));
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_debug_lists_provider_names() {
        let service = FinancialDataService::new()
            .with_provider(Arc::new(StubProvider::failing("alpha")))
            .with_provider(Arc::new(StubProvider::failing("beta")));

        let rendered = format!("{service:?}");
        assert!(rendered.contains("alpha"));
        assert!(rendered.contains("beta"));
        assert_eq!(service.provider_names(), vec!["alpha", "beta"]);
    }
}
