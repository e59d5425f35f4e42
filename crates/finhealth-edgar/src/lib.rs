#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finhealth/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR structured-filing provider.
//!
//! This crate implements [`FinancialDataProvider`] against the SEC EDGAR
//! XBRL APIs:
//!
//! - CIK lookup from ticker symbols via the bulk company-tickers map
//! - Company facts (tag -> year -> value series) from the companyfacts API
//! - Tag-alias resolution and per-fiscal-year annual aggregation
//!
//! # Example
//!
//! ```no_run
//! use finhealth_edgar::EdgarProvider;
//! use finhealth_core::{FinancialDataProvider, Ticker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = EdgarProvider::new("MyApp/1.0 (contact@example.com)");
//!
//!     let ticker = Ticker::new("AAPL");
//!     let identity = provider.resolve_identity(&ticker).await?;
//!     println!("Company: {:?} (CIK: {:?})", identity.name, identity.cik);
//!
//!     let statements = provider.fetch_statements(&ticker, 5).await?;
//!     for stmt in statements {
//!         println!("FY{}: revenue {:?}", stmt.fiscal_year, stmt.income.revenue);
//!     }
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use finhealth_core::{
    CompanyIdentity, FinancialDataProvider, Period, PeriodStatement, ProviderError, ResponseCache,
    Result, Ticker,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

/// SEC EDGAR API base URL.
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// SEC bulk ticker -> CIK map URL.
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Default rate limit: 10 requests per second (SEC requirement).
const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(100);

/// TTL for cached upstream payloads.
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cache key for the bulk CIK map.
const CIK_MAP_CACHE_KEY: &str = "sec:cik_map";

/// Rate limiter to ensure we don't exceed SEC's rate limits.
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

// =============================================================================
// Metric Alias Registry
// =============================================================================

/// Canonical metrics extractable from EDGAR companyfacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Total revenue or sales.
    Revenue,
    /// Cost of goods sold.
    CostOfGoodsSold,
    /// Gross profit.
    GrossProfit,
    /// Operating income.
    OperatingIncome,
    /// Interest expense.
    InterestExpense,
    /// Net income.
    NetIncome,
    /// Basic earnings per share.
    EpsBasic,
    /// Diluted earnings per share.
    EpsDiluted,
    /// Cash and cash equivalents.
    CashAndEquivalents,
    /// Accounts receivable.
    AccountsReceivable,
    /// Inventory.
    Inventory,
    /// Total current assets.
    CurrentAssets,
    /// Total assets.
    TotalAssets,
    /// Total current liabilities.
    CurrentLiabilities,
    /// Total liabilities.
    TotalLiabilities,
    /// Total debt, summed across its alias tags.
    TotalDebt,
    /// Total shareholders' equity.
    ShareholdersEquity,
    /// Shares outstanding.
    SharesOutstanding,
    /// Net cash flow from operating activities.
    OperatingCashFlow,
    /// Capital expenditures.
    CapitalExpenditures,
    /// Cash paid for dividends.
    DividendPayments,
}

/// How a metric's alias list is resolved against a fact set.
#[derive(Clone, Copy, Debug)]
pub enum AliasRule {
    /// The first alias present in the fact set wins; remaining aliases are
    /// ignored even if present. Tolerates filer-to-filer tag variation.
    FirstMatch(&'static [&'static str]),
    /// The metric is the per-year sum of every alias tag's value. Used where
    /// the canonical metric is genuinely composed of several filed line
    /// items (e.g., current plus long-term debt).
    Sum(&'static [&'static str]),
}

impl Metric {
    /// Every canonical metric, in statement-section order.
    pub const ALL: &'static [Self] = &[
        Self::Revenue,
        Self::CostOfGoodsSold,
        Self::GrossProfit,
        Self::OperatingIncome,
        Self::InterestExpense,
        Self::NetIncome,
        Self::EpsBasic,
        Self::EpsDiluted,
        Self::CashAndEquivalents,
        Self::AccountsReceivable,
        Self::Inventory,
        Self::CurrentAssets,
        Self::TotalAssets,
        Self::CurrentLiabilities,
        Self::TotalLiabilities,
        Self::TotalDebt,
        Self::ShareholdersEquity,
        Self::SharesOutstanding,
        Self::OperatingCashFlow,
        Self::CapitalExpenditures,
        Self::DividendPayments,
    ];

    /// Returns the alias resolution rule for this metric.
    ///
    /// Alias lists are ordered by preference. Different filers use different
    /// XBRL tags for the same concept; the registry is static rather than
    /// configurable so that resolution stays a plain lookup.
    #[must_use]
    pub const fn alias_rule(self) -> AliasRule {
        match self {
            // Income statement
            Self::Revenue => AliasRule::FirstMatch(&[
                "Revenues",
                "SalesRevenueNet",
                "TotalRevenues",
                "RevenueFromContractWithCustomerExcludingAssessedTax",
            ]),
            Self::CostOfGoodsSold => {
                AliasRule::FirstMatch(&["CostOfGoodsAndServicesSold", "CostOfRevenue"])
            }
            Self::GrossProfit => AliasRule::FirstMatch(&["GrossProfit"]),
            Self::OperatingIncome => AliasRule::FirstMatch(&["OperatingIncomeLoss"]),
            Self::InterestExpense => AliasRule::FirstMatch(&["InterestExpense"]),
            Self::NetIncome => AliasRule::FirstMatch(&["NetIncomeLoss", "ProfitLoss"]),
            Self::EpsBasic => AliasRule::FirstMatch(&["EarningsPerShareBasic"]),
            Self::EpsDiluted => AliasRule::FirstMatch(&["EarningsPerShareDiluted"]),

            // Balance sheet
            Self::CashAndEquivalents => {
                AliasRule::FirstMatch(&["CashAndCashEquivalentsAtCarryingValue"])
            }
            Self::AccountsReceivable => AliasRule::FirstMatch(&["AccountsReceivableNetCurrent"]),
            Self::Inventory => AliasRule::FirstMatch(&["InventoryNet"]),
            Self::CurrentAssets => AliasRule::FirstMatch(&["AssetsCurrent"]),
            Self::TotalAssets => AliasRule::FirstMatch(&["Assets"]),
            Self::CurrentLiabilities => AliasRule::FirstMatch(&["LiabilitiesCurrent"]),
            Self::TotalLiabilities => AliasRule::FirstMatch(&["Liabilities"]),
            Self::TotalDebt => AliasRule::Sum(&[
                "DebtCurrent",
                "LongTermDebt",
                "LongTermDebtAndCapitalLeaseObligations",
                "LongTermDebtNoncurrent",
            ]),
            Self::ShareholdersEquity => AliasRule::FirstMatch(&[
                "StockholdersEquity",
                "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
            ]),
            Self::SharesOutstanding => AliasRule::FirstMatch(&[
                "WeightedAverageNumberOfDilutedSharesOutstanding",
                "WeightedAverageNumberOfSharesOutstandingBasic",
            ]),

            // Cash flow statement
            Self::OperatingCashFlow => {
                AliasRule::FirstMatch(&["NetCashProvidedByUsedInOperatingActivities"])
            }
            Self::CapitalExpenditures => {
                AliasRule::FirstMatch(&["PaymentsToAcquirePropertyPlantAndEquipment"])
            }
            Self::DividendPayments => AliasRule::FirstMatch(&["PaymentsOfDividends"]),
        }
    }

    /// Writes a resolved value into the matching statement section field.
    fn assign(self, stmt: &mut PeriodStatement, value: f64) {
        match self {
            Self::Revenue => stmt.income.revenue = Some(value),
            Self::CostOfGoodsSold => stmt.income.cost_of_goods_sold = Some(value),
            Self::GrossProfit => stmt.income.gross_profit = Some(value),
            Self::OperatingIncome => stmt.income.operating_income = Some(value),
            Self::InterestExpense => stmt.income.interest_expense = Some(value),
            Self::NetIncome => stmt.income.net_income = Some(value),
            Self::EpsBasic => stmt.income.eps_basic = Some(value),
            Self::EpsDiluted => stmt.income.eps_diluted = Some(value),
            Self::CashAndEquivalents => stmt.balance_sheet.cash_and_equivalents = Some(value),
            Self::AccountsReceivable => stmt.balance_sheet.accounts_receivable = Some(value),
            Self::Inventory => stmt.balance_sheet.inventory = Some(value),
            Self::CurrentAssets => stmt.balance_sheet.current_assets = Some(value),
            Self::TotalAssets => stmt.balance_sheet.total_assets = Some(value),
            Self::CurrentLiabilities => stmt.balance_sheet.current_liabilities = Some(value),
            Self::TotalLiabilities => stmt.balance_sheet.total_liabilities = Some(value),
            Self::TotalDebt => stmt.balance_sheet.total_debt = Some(value),
            Self::ShareholdersEquity => stmt.balance_sheet.shareholders_equity = Some(value),
            Self::SharesOutstanding => stmt.balance_sheet.shares_outstanding = Some(value),
            Self::OperatingCashFlow => stmt.cash_flow.operating_cash_flow = Some(value),
            Self::CapitalExpenditures => stmt.cash_flow.capital_expenditures = Some(value),
            Self::DividendPayments => stmt.cash_flow.dividend_payments = Some(value),
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

/// SEC EDGAR structured-filing provider.
///
/// The ticker -> CIK map is downloaded once and held for the provider's
/// lifetime; call [`reload_cik_map`](Self::reload_cik_map) to refresh it.
/// Requests are rate-limited per SEC requirements (max 10 requests/second).
pub struct EdgarProvider {
    client: reqwest::Client,
    rate_limiter: Mutex<RateLimiter>,
    cache: Option<Arc<dyn ResponseCache>>,
    cik_map: RwLock<Option<HashMap<String, CompanyTickerInfo>>>,
}

impl std::fmt::Debug for EdgarProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgarProvider")
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .finish()
    }
}

impl EdgarProvider {
    /// Create a new EDGAR provider with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self::with_client(client)
    }

    /// Create a new EDGAR provider with a custom HTTP client.
    ///
    /// The client must already carry an identifying `User-Agent`.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limiter: Mutex::new(RateLimiter::new(DEFAULT_RATE_LIMIT)),
            cache: None,
            cik_map: RwLock::new(None),
        }
    }

    /// Attach a read-through response cache.
    ///
    /// Both the CIK map and companyfacts payloads are served through it.
    /// Cache failures degrade to direct network fetches.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Discard the in-memory CIK map so the next lookup re-downloads it.
    pub async fn reload_cik_map(&self) {
        *self.cik_map.write().await = None;
        debug!("CIK map invalidated");
    }

    /// Fetch raw bytes, going through the response cache when configured.
    async fn get_bytes(&self, cache_key: &str, url: &str) -> Result<Vec<u8>> {
        if let Some(cache) = &self.cache {
            match cache.get(cache_key).await {
                Ok(Some(bytes)) => {
                    debug!(key = cache_key, "Cache hit");
                    return Ok(bytes);
                }
                Ok(None) => debug!(key = cache_key, "Cache miss"),
                Err(e) => warn!(key = cache_key, error = %e, "Cache read failed"),
            }
        }

        self.rate_limiter.lock().await.wait().await;

        debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ProviderError::Network(format!(
                "Request to {} failed: HTTP {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?
            .to_vec();

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(cache_key, &bytes, CACHE_TTL).await {
                warn!(key = cache_key, error = %e, "Cache write failed");
            }
        }

        Ok(bytes)
    }

    /// Ensure the ticker -> CIK map is loaded, downloading it on first use.
    async fn ensure_cik_map(&self) -> Result<()> {
        if self.cik_map.read().await.is_some() {
            return Ok(());
        }

        let bytes = self.get_bytes(CIK_MAP_CACHE_KEY, COMPANY_TICKERS_URL).await?;
        let raw: HashMap<String, CompanyTickerInfo> = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::Parse(format!("Failed to parse company tickers: {e}")))?;

        let by_ticker: HashMap<String, CompanyTickerInfo> = raw
            .into_values()
            .map(|entry| (entry.ticker.to_uppercase(), entry))
            .collect();

        info!("Loaded CIK map for {} tickers", by_ticker.len());
        *self.cik_map.write().await = Some(by_ticker);
        Ok(())
    }

    /// Look up a company's CIK map entry from its ticker symbol.
    async fn cik_entry(&self, ticker: &Ticker) -> Result<CompanyTickerInfo> {
        self.ensure_cik_map().await?;

        let map = self.cik_map.read().await;
        map.as_ref()
            .and_then(|m| m.get(ticker.as_str()))
            .cloned()
            .ok_or_else(|| ProviderError::TickerNotFound(ticker.to_string()))
    }

    /// Look up a company's CIK as a zero-padded 10-digit string.
    pub async fn get_cik(&self, ticker: &Ticker) -> Result<String> {
        let entry = self.cik_entry(ticker).await?;
        let cik = format!("{:0>10}", entry.cik_str);
        debug!("Found CIK {} for ticker {}", cik, ticker);
        Ok(cik)
    }

    /// Fetch the bulk companyfacts set for a CIK.
    async fn fetch_company_facts(&self, cik: &str) -> Result<CompanyFactsResponse> {
        let url = format!("{EDGAR_BASE_URL}/api/xbrl/companyfacts/CIK{cik}.json");
        let cache_key = format!("sec:facts:{cik}");

        let bytes = self.get_bytes(&cache_key, &url).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::Parse(format!("Failed to parse company facts: {e}")))
    }
}

#[async_trait]
impl FinancialDataProvider for EdgarProvider {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    fn description(&self) -> &str {
        "SEC EDGAR structured-filing provider reconstructing annual statements from 10-K XBRL facts"
    }

    async fn resolve_identity(&self, ticker: &Ticker) -> Result<CompanyIdentity> {
        info!("Resolving identity for {} via SEC EDGAR", ticker);
        let entry = self.cik_entry(ticker).await?;

        // The bulk ticker map carries name and CIK only; sector, industry and
        // the rest stay absent for enrichment by other providers.
        Ok(CompanyIdentity::new(ticker.clone())
            .with_name(entry.title)
            .with_cik(format!("{:0>10}", entry.cik_str)))
    }

    async fn fetch_statements(
        &self,
        ticker: &Ticker,
        num_years: usize,
    ) -> Result<Vec<PeriodStatement>> {
        info!("Fetching statements for {} via SEC EDGAR", ticker);
        let cik = self.get_cik(ticker).await?;
        let facts = self.fetch_company_facts(&cik).await?;

        let source = format!("{EDGAR_BASE_URL}/api/xbrl/companyfacts/CIK{cik}.json");
        build_annual_statements(&facts, ticker, num_years, &source)
    }
}

// =============================================================================
// Annual aggregation
// =============================================================================

/// Unit types accepted for a fact series, in preference order.
const UNIT_PREFERENCE: &[&str] = &["USD", "USD/shares", "shares"];

/// Per-fiscal-year accumulation of matched metric values.
#[derive(Debug, Default)]
struct YearData {
    metrics: HashMap<Metric, f64>,
    end_date: Option<NaiveDate>,
}

/// Reconstruct per-fiscal-year statements from a companyfacts payload.
///
/// Only full-year 10-K facts are used. For each metric the alias list is
/// walked in preference order; the first tag present in the fact set wins,
/// except for [`AliasRule::Sum`] metrics, which add every alias tag's value
/// per fiscal year. Years are sorted descending, truncated to `num_years`,
/// and years whose aggregation lacks a period end date are skipped.
fn build_annual_statements(
    facts: &CompanyFactsResponse,
    ticker: &Ticker,
    num_years: usize,
    source: &str,
) -> Result<Vec<PeriodStatement>> {
    let gaap = facts.facts.get("us-gaap").ok_or_else(|| {
        ProviderError::Parse(format!("No US-GAAP facts found for {ticker}"))
    })?;

    let mut annual: BTreeMap<i32, YearData> = BTreeMap::new();

    for &metric in Metric::ALL {
        match metric.alias_rule() {
            AliasRule::FirstMatch(tags) => {
                let Some(series) = tags.iter().find_map(|tag| unit_series(gaap, tag)) else {
                    continue;
                };
                for (fy, value, end) in annual_values(series) {
                    let year = annual.entry(fy).or_default();
                    // Later filings of the same year overwrite earlier ones.
                    year.metrics.insert(metric, value);
                    if year.end_date.is_none() {
                        year.end_date = end;
                    }
                }
            }
            AliasRule::Sum(tags) => {
                for tag in tags {
                    let Some(series) = unit_series(gaap, tag) else {
                        continue;
                    };
                    // One contribution per tag per year: keep the most recent
                    // filing, then add across tags.
                    let mut latest: HashMap<i32, (f64, Option<NaiveDate>)> = HashMap::new();
                    for (fy, value, end) in annual_values(series) {
                        latest.insert(fy, (value, end));
                    }
                    for (fy, (value, end)) in latest {
                        let year = annual.entry(fy).or_default();
                        *year.metrics.entry(metric).or_insert(0.0) += value;
                        if year.end_date.is_none() {
                            year.end_date = end;
                        }
                    }
                }
            }
        }
    }

    let mut statements = Vec::new();
    for (&fy, data) in annual.iter().rev().take(num_years) {
        let Some(end_date) = data.end_date else {
            // Incomplete aggregation for this year.
            warn!("Skipping FY{} for {}: no period end date", fy, ticker);
            continue;
        };

        let mut stmt =
            PeriodStatement::new(ticker.clone(), Period::FullYear, fy, end_date, source);
        for (&metric, &value) in &data.metrics {
            metric.assign(&mut stmt, value);
        }

        // Derive free cash flow when both components are present.
        stmt.cash_flow.free_cash_flow = match (
            stmt.cash_flow.operating_cash_flow,
            stmt.cash_flow.capital_expenditures,
        ) {
            (Some(ocf), Some(capex)) => Some(ocf - capex.abs()),
            _ => None,
        };

        statements.push(stmt);
    }

    if statements.is_empty() {
        return Err(ProviderError::NoStatements(format!(
            "{ticker}: no full-year 10-K facts could be aggregated"
        )));
    }

    Ok(statements)
}

/// Returns the preferred unit series for a tag, if the tag is present.
fn unit_series<'a>(
    gaap: &'a HashMap<String, TagFacts>,
    tag: &str,
) -> Option<&'a Vec<FactValue>> {
    let units = gaap.get(tag)?.units.as_ref()?;
    UNIT_PREFERENCE.iter().find_map(|unit| units.get(*unit))
}

/// Iterates the full-year 10-K entries of a fact series.
fn annual_values(series: &[FactValue]) -> impl Iterator<Item = (i32, f64, Option<NaiveDate>)> + '_ {
    series.iter().filter_map(|fact| {
        let is_annual = fact.form.as_deref() == Some("10-K") && fact.fp.as_deref() == Some("FY");
        if !is_annual {
            return None;
        }
        let fy = fact.fy?;
        let end = NaiveDate::parse_from_str(&fact.end, "%Y-%m-%d").ok();
        Some((fy, fact.val, end))
    })
}

// =============================================================================
// SEC API Response Types
// =============================================================================

/// One company's entry in the bulk ticker map.
#[derive(Clone, Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer).
    cik_str: u64,
    /// Ticker symbol.
    ticker: String,
    /// Company name.
    title: String,
}

/// Response from the SEC EDGAR companyfacts API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyFactsResponse {
    /// Facts organized by taxonomy and tag.
    facts: HashMap<String, HashMap<String, TagFacts>>,
}

/// Facts for a specific XBRL tag.
#[derive(Debug, Deserialize)]
struct TagFacts {
    /// Units (USD, shares, etc.) containing the actual fact values.
    units: Option<HashMap<String, Vec<FactValue>>>,
}

/// A single fact value with filing metadata.
#[derive(Debug, Clone, Deserialize)]
struct FactValue {
    /// End date of the period.
    end: String,
    /// Value.
    val: f64,
    /// Fiscal year.
    #[serde(default)]
    fy: Option<i32>,
    /// Fiscal period ("FY", "Q1", ...).
    #[serde(default)]
    fp: Option<String>,
    /// Form type ("10-K", "10-Q", ...).
    #[serde(default)]
    form: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
