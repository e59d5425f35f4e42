#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finhealth/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance market-data provider.
//!
//! This crate implements [`FinancialDataProvider`] against two Yahoo
//! endpoints:
//!
//! - The quote-summary API for one descriptive payload per ticker
//!   (profile, sector, industry, narrative summary)
//! - The fundamentals-timeseries API for three period-indexed statement
//!   tables (income, balance sheet, cash flow), one column per fiscal year
//!
//! # Example
//!
//! ```no_run
//! use finhealth_yahoo::YahooProvider;
//! use finhealth_core::{FinancialDataProvider, Ticker};
//!
//! # async fn example() -> finhealth_core::Result<()> {
//! let provider = YahooProvider::new();
//! let ticker = Ticker::new("AAPL");
//!
//! let identity = provider.resolve_identity(&ticker).await?;
//! println!("Sector: {:?}", identity.sector);
//!
//! let statements = provider.fetch_statements(&ticker, 4).await?;
//! println!("Fetched {} annual statements", statements.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use finhealth_core::{
    BalanceSheet, CashFlowStatement, CompanyIdentity, FinancialDataProvider, IncomeStatement,
    Period, PeriodStatement, ProviderError, Result, Ticker,
};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info};

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Yahoo Finance fundamentals timeseries API base URL.
const TIMESERIES_URL: &str =
    "https://query1.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

/// Default rate limit delay in milliseconds.
const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Income statement fields and the timeseries labels that carry them.
const INCOME_SERIES: &[(&str, &str)] = &[
    ("revenue", "annualTotalRevenue"),
    ("cost_of_goods_sold", "annualCostOfRevenue"),
    ("gross_profit", "annualGrossProfit"),
    ("operating_income", "annualOperatingIncome"),
    ("interest_expense", "annualInterestExpense"),
    ("net_income", "annualNetIncome"),
    ("ebitda", "annualEBITDA"),
    ("eps_basic", "annualBasicEPS"),
    ("eps_diluted", "annualDilutedEPS"),
];

/// Balance sheet fields and the timeseries labels that carry them.
const BALANCE_SERIES: &[(&str, &str)] = &[
    ("total_assets", "annualTotalAssets"),
    ("current_assets", "annualCurrentAssets"),
    ("cash_and_equivalents", "annualCashAndCashEquivalents"),
    ("inventory", "annualInventory"),
    ("accounts_receivable", "annualAccountsReceivable"),
    (
        "total_liabilities",
        "annualTotalLiabilitiesNetMinorityInterest",
    ),
    ("current_liabilities", "annualCurrentLiabilities"),
    ("total_debt", "annualTotalDebt"),
    ("shareholders_equity", "annualStockholdersEquity"),
    ("shares_outstanding", "annualShareIssued"),
];

/// Cash flow fields and the timeseries labels that carry them.
const CASHFLOW_SERIES: &[(&str, &str)] = &[
    ("operating_cash_flow", "annualOperatingCashFlow"),
    ("capital_expenditures", "annualCapitalExpenditure"),
    ("free_cash_flow", "annualFreeCashFlow"),
    ("dividend_payments", "annualCashDividendsPaid"),
];

/// One period-indexed statement table: series label -> end date -> value.
type SeriesTable = HashMap<String, HashMap<NaiveDate, f64>>;

/// Yahoo Finance market-data provider.
///
/// Secondary source with richer descriptive metadata than the filing
/// registry, and simpler tabular statement data mapped into the same
/// canonical shape.
#[derive(Debug)]
pub struct YahooProvider {
    client: reqwest::Client,
    rate_limit_ms: u64,
    last_request_time: AtomicU64,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider with default settings.
    ///
    /// Uses built-in rate limiting of 1 request per second.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rate_limit(Duration::from_millis(DEFAULT_RATE_LIMIT_MS))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Create a new Yahoo Finance provider with custom rate limiting.
    #[must_use]
    pub fn with_rate_limit(rate_limit: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            rate_limit_ms: rate_limit.as_millis() as u64,
            last_request_time: AtomicU64::new(0),
        }
    }

    /// Apply rate limiting before making a request.
    async fn apply_rate_limit(&self) {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        let last = self.last_request_time.load(Ordering::Relaxed);
        let elapsed = now.saturating_sub(last);

        if elapsed < self.rate_limit_ms {
            let wait_time = self.rate_limit_ms - elapsed;
            debug!("Rate limiting: waiting {}ms", wait_time);
            sleep(Duration::from_millis(wait_time)).await;
        }

        self.last_request_time.store(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64,
            Ordering::Relaxed,
        );
    }

    /// Make a GET request and parse the JSON response.
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.apply_rate_limit().await;

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

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Fetch one period-indexed table covering the given series labels.
    async fn fetch_table(
        &self,
        ticker: &Ticker,
        labels: &[(&str, &str)],
        num_years: usize,
    ) -> Result<SeriesTable> {
        let types: Vec<&str> = labels.iter().map(|(_, label)| *label).collect();
        let period2 = Utc::now().timestamp();
        // One extra year of slack so a fiscal year straddling the window edge
        // is not dropped.
        let period1 = period2 - ((num_years as i64) + 1) * 366 * 86_400;

        let url = format!(
            "{TIMESERIES_URL}/{}?type={}&period1={period1}&period2={period2}",
            ticker.as_str(),
            types.join(",")
        );

        let response: TimeseriesResponse = self.get_json(&url).await?;
        Ok(parse_timeseries(response))
    }
}

#[async_trait]
impl FinancialDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn description(&self) -> &str {
        "Yahoo Finance market-data provider for company profiles and annual statement tables"
    }

    async fn resolve_identity(&self, ticker: &Ticker) -> Result<CompanyIdentity> {
        info!("Resolving identity for {} via Yahoo Finance", ticker);

        let url = format!(
            "{QUOTE_SUMMARY_URL}/{}?modules=assetProfile%2Cprice",
            ticker.as_str()
        );
        let response: QuoteSummaryResponse = self.get_json(&url).await?;

        build_identity(ticker, response)
    }

    async fn fetch_statements(
        &self,
        ticker: &Ticker,
        num_years: usize,
    ) -> Result<Vec<PeriodStatement>> {
        info!("Fetching statements for {} via Yahoo Finance", ticker);

        let income = self.fetch_table(ticker, INCOME_SERIES, num_years).await?;
        let balance = self.fetch_table(ticker, BALANCE_SERIES, num_years).await?;
        let cash_flow = self.fetch_table(ticker, CASHFLOW_SERIES, num_years).await?;

        build_statements(ticker, num_years, &income, &balance, &cash_flow)
    }
}

// =============================================================================
// Payload mapping
// =============================================================================

/// Map the descriptive quote-summary payload into a [`CompanyIdentity`].
///
/// An empty result array, or a payload missing the price module's
/// `longName`, is treated as an invalid response for the ticker.
fn build_identity(ticker: &Ticker, response: QuoteSummaryResponse) -> Result<CompanyIdentity> {
    let result = response
        .quote_summary
        .result
        .and_then(|mut results| {
            if results.is_empty() {
                None
            } else {
                Some(results.remove(0))
            }
        })
        .ok_or_else(|| ProviderError::EmptyPayload {
            provider: "Yahoo Finance".to_string(),
            ticker: ticker.to_string(),
        })?;

    let price = result.price.unwrap_or_default();
    let name = price.long_name.ok_or_else(|| ProviderError::EmptyPayload {
        provider: "Yahoo Finance".to_string(),
        ticker: ticker.to_string(),
    })?;

    let mut identity = CompanyIdentity::new(ticker.clone()).with_name(name);
    if let Some(exchange) = price.exchange_name {
        identity = identity.with_exchange(exchange);
    }

    if let Some(profile) = result.asset_profile {
        if let Some(sector) = profile.sector {
            identity = identity.with_sector(sector);
        }
        if let Some(industry) = profile.industry {
            identity = identity.with_industry(industry);
        }
        if let Some(summary) = profile.long_business_summary {
            identity = identity.with_description(summary);
        }
        if let Some(website) = profile.website {
            identity = identity.with_website(website);
        }
    }

    Ok(identity)
}

/// Flatten a timeseries response into a label -> end date -> value table.
fn parse_timeseries(response: TimeseriesResponse) -> SeriesTable {
    let mut table = SeriesTable::new();

    for result in response.timeseries.result.unwrap_or_default() {
        let Some(label) = result.meta.series_type.first().cloned() else {
            continue;
        };
        let Some(raw_series) = result.series.get(&label) else {
            continue;
        };
        let Ok(values) = serde_json::from_value::<Vec<Option<TimeseriesValue>>>(raw_series.clone())
        else {
            continue;
        };

        let entries = table.entry(label).or_default();
        for value in values.into_iter().flatten() {
            if let Ok(end) = NaiveDate::parse_from_str(&value.as_of_date, "%Y-%m-%d") {
                entries.insert(end, value.reported_value.raw);
            }
        }
    }

    table
}

/// Construct annual statements from the three period-indexed tables.
///
/// Periods are taken from the income table's columns, most recent first,
/// truncated to `num_years`. Absent metrics are tolerated per field; empty
/// income or balance tables mean the source has nothing usable.
fn build_statements(
    ticker: &Ticker,
    num_years: usize,
    income: &SeriesTable,
    balance: &SeriesTable,
    cash_flow: &SeriesTable,
) -> Result<Vec<PeriodStatement>> {
    let empty = |table: &SeriesTable| table.values().all(|series| series.is_empty());
    if empty(income) || empty(balance) {
        return Err(ProviderError::EmptyPayload {
            provider: "Yahoo Finance".to_string(),
            ticker: ticker.to_string(),
        });
    }

    let mut end_dates: Vec<NaiveDate> = income
        .values()
        .flat_map(|series| series.keys().copied())
        .collect();
    end_dates.sort_unstable();
    end_dates.dedup();
    end_dates.reverse();

    let lookup = |table: &SeriesTable, label: &str, end: NaiveDate| -> Option<f64> {
        table.get(label).and_then(|series| series.get(&end)).copied()
    };

    let mut statements = Vec::new();
    for end_date in end_dates.into_iter().take(num_years) {
        let mut stmt = PeriodStatement::new(
            ticker.clone(),
            Period::FullYear,
            end_date.year(),
            end_date,
            "https://finance.yahoo.com",
        );

        stmt.income = IncomeStatement {
            revenue: lookup(income, "annualTotalRevenue", end_date),
            cost_of_goods_sold: lookup(income, "annualCostOfRevenue", end_date),
            gross_profit: lookup(income, "annualGrossProfit", end_date),
            operating_income: lookup(income, "annualOperatingIncome", end_date),
            interest_expense: lookup(income, "annualInterestExpense", end_date),
            net_income: lookup(income, "annualNetIncome", end_date),
            ebitda: lookup(income, "annualEBITDA", end_date),
            eps_basic: lookup(income, "annualBasicEPS", end_date),
            eps_diluted: lookup(income, "annualDilutedEPS", end_date),
        };
        stmt.balance_sheet = BalanceSheet {
            total_assets: lookup(balance, "annualTotalAssets", end_date),
            current_assets: lookup(balance, "annualCurrentAssets", end_date),
            cash_and_equivalents: lookup(balance, "annualCashAndCashEquivalents", end_date),
            inventory: lookup(balance, "annualInventory", end_date),
            accounts_receivable: lookup(balance, "annualAccountsReceivable", end_date),
            total_liabilities: lookup(
                balance,
                "annualTotalLiabilitiesNetMinorityInterest",
                end_date,
            ),
            current_liabilities: lookup(balance, "annualCurrentLiabilities", end_date),
            total_debt: lookup(balance, "annualTotalDebt", end_date),
            shareholders_equity: lookup(balance, "annualStockholdersEquity", end_date),
            shares_outstanding: lookup(balance, "annualShareIssued", end_date),
        };
        stmt.cash_flow = CashFlowStatement {
            operating_cash_flow: lookup(cash_flow, "annualOperatingCashFlow", end_date),
            capital_expenditures: lookup(cash_flow, "annualCapitalExpenditure", end_date),
            free_cash_flow: lookup(cash_flow, "annualFreeCashFlow", end_date),
            dividend_payments: lookup(cash_flow, "annualCashDividendsPaid", end_date),
        };

        statements.push(stmt);
    }

    if statements.is_empty() {
        return Err(ProviderError::NoStatements(format!(
            "{ticker}: no annual periods present in Yahoo timeseries tables"
        )));
    }

    Ok(statements)
}

// =============================================================================
// Yahoo API Response Types
// =============================================================================

/// Quote summary response wrapper.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<QuoteSummaryResult>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    asset_profile: Option<AssetProfile>,
    price: Option<PriceModule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
    long_business_summary: Option<String>,
    website: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    exchange_name: Option<String>,
}

/// Fundamentals timeseries response wrapper.
#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: Timeseries,
}

#[derive(Debug, Deserialize)]
struct Timeseries {
    result: Option<Vec<TimeseriesResult>>,
}

/// One series in a timeseries response; the values live under a key equal
/// to the series label named in `meta.type`.
#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    #[serde(flatten)]
    series: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(rename = "type", default)]
    series_type: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeseriesValue {
    as_of_date: String,
    reported_value: ReportedValue,
}

#[derive(Debug, Deserialize)]
struct ReportedValue {
    raw: f64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn quote_summary_from(value: serde_json::Value) -> QuoteSummaryResponse {
        serde_json::from_value(value).unwrap()
    }

    fn table(entries: &[(&str, &str, f64)]) -> SeriesTable {
        let mut table = SeriesTable::new();
        for (label, date, value) in entries {
            table
                .entry((*label).to_string())
                .or_default()
                .insert(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), *value);
        }
        table
    }

    #[test]
    fn test_identity_mapping() {
        let response = quote_summary_from(json!({
            "quoteSummary": {"result": [{
                "price": {"longName": "Apple Inc.", "exchangeName": "NasdaqGS"},
                "assetProfile": {
                    "sector": "Technology",
                    "industry": "Consumer Electronics",
                    "longBusinessSummary": "Designs consumer electronics.",
                    "website": "https://www.apple.com"
                }
            }], "error": null}
        }));

        let identity = build_identity(&Ticker::new("AAPL"), response).unwrap();
        assert_eq!(identity.name.as_deref(), Some("Apple Inc."));
        assert_eq!(identity.sector.as_deref(), Some("Technology"));
        assert_eq!(identity.website.as_deref(), Some("https://www.apple.com"));
        assert!(identity.cik.is_none());
    }

    #[test]
    fn test_empty_result_is_an_error() {
        let response = quote_summary_from(json!({
            "quoteSummary": {"result": [], "error": null}
        }));

        let result = build_identity(&Ticker::new("ZZZZ"), response);
        assert!(matches!(result, Err(ProviderError::EmptyPayload { .. })));
    }

    #[test]
    fn test_missing_name_sentinel_is_an_error() {
        let response = quote_summary_from(json!({
            "quoteSummary": {"result": [{"price": {"exchangeName": "NYSE"}}], "error": null}
        }));

        let result = build_identity(&Ticker::new("ZZZZ"), response);
        assert!(matches!(result, Err(ProviderError::EmptyPayload { .. })));
    }

    #[test]
    fn test_parse_timeseries_skips_null_entries() {
        let response: TimeseriesResponse = serde_json::from_value(json!({
            "timeseries": {"result": [{
                "meta": {"symbol": ["AAPL"], "type": ["annualTotalRevenue"]},
                "timestamp": [1664496000i64, 1696032000i64],
                "annualTotalRevenue": [
                    null,
                    {"asOfDate": "2023-09-30", "periodType": "12M",
                     "reportedValue": {"raw": 383285000000.0, "fmt": "383.29B"}}
                ]
            }], "error": null}
        }))
        .unwrap();

        let table = parse_timeseries(response);
        let series = table.get("annualTotalRevenue").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(
            series.get(&NaiveDate::from_ymd_opt(2023, 9, 30).unwrap()),
            Some(&383_285_000_000.0)
        );
    }

    #[test]
    fn test_statements_from_tables() {
        let income = table(&[
            ("annualTotalRevenue", "2023-09-30", 1000.0),
            ("annualNetIncome", "2023-09-30", 100.0),
        ]);
        let balance = table(&[
            ("annualTotalAssets", "2023-09-30", 5000.0),
            ("annualTotalDebt", "2023-09-30", 800.0),
        ]);
        let cash = table(&[("annualOperatingCashFlow", "2023-09-30", 400.0)]);

        let statements =
            build_statements(&Ticker::new("AAPL"), 5, &income, &balance, &cash).unwrap();
        assert_eq!(statements.len(), 1);

        let stmt = &statements[0];
        assert_eq!(stmt.fiscal_year, 2023);
        assert_eq!(stmt.income.revenue, Some(1000.0));
        assert_eq!(stmt.balance_sheet.total_debt, Some(800.0));
        assert_eq!(stmt.cash_flow.operating_cash_flow, Some(400.0));
        // Metrics never supplied by this source stay absent.
        assert!(stmt.balance_sheet.inventory.is_none());
    }

    #[test]
    fn test_periods_most_recent_first_and_truncated() {
        let entries: Vec<(String, f64)> = (2018..=2023)
            .map(|year| (format!("{year}-12-31"), year as f64))
            .collect();
        let mut income = SeriesTable::new();
        for (date, value) in &entries {
            income
                .entry("annualTotalRevenue".to_string())
                .or_default()
                .insert(NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(), *value);
        }
        let balance = table(&[("annualTotalAssets", "2023-12-31", 1.0)]);
        let cash = SeriesTable::new();

        let statements =
            build_statements(&Ticker::new("TEST"), 5, &income, &balance, &cash).unwrap();

        let years: Vec<i32> = statements.iter().map(|s| s.fiscal_year).collect();
        assert_eq!(years, vec![2023, 2022, 2021, 2020, 2019]);
    }

    #[test]
    fn test_empty_tables_are_an_error() {
        let empty = SeriesTable::new();
        let result = build_statements(&Ticker::new("TEST"), 5, &empty, &empty, &empty);
        assert!(matches!(result, Err(ProviderError::EmptyPayload { .. })));
    }

    #[test]
    fn test_provider_metadata() {
        let provider = YahooProvider::new();
        assert_eq!(provider.name(), "Yahoo Finance");
        assert!(!provider.description().is_empty());
    }
}
