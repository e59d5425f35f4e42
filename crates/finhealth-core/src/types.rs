//! Canonical data types for company financial data.
//!
//! This module defines the fundamental data structures:
//!
//! - [`Ticker`] - Exchange symbol identifying a company
//! - [`CompanyIdentity`] - Company reference information, built additively
//! - [`IncomeStatement`], [`BalanceSheet`], [`CashFlowStatement`] - Statement sections
//! - [`PeriodStatement`] - One reporting period's full statement set
//! - [`RatioSet`] - Derived accounting ratios for one period

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::period::Period;

/// An exchange ticker symbol.
///
/// Tickers are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Creates a new ticker from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().to_uppercase())
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Ticker {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Ticker {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Company reference information.
///
/// All fields except `ticker` are optional. Identities are built additively:
/// [`merge_missing`](Self::merge_missing) fills absent fields from a secondary
/// source and never overwrites a field that is already present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    /// Exchange ticker symbol.
    pub ticker: Ticker,
    /// Company display name.
    pub name: Option<String>,
    /// Primary exchange.
    pub exchange: Option<String>,
    /// Business sector.
    pub sector: Option<String>,
    /// Industry within the sector.
    pub industry: Option<String>,
    /// Narrative business description.
    pub description: Option<String>,
    /// Company website.
    pub website: Option<String>,
    /// SEC CIK number (zero-padded to 10 digits).
    pub cik: Option<String>,
}

impl CompanyIdentity {
    /// Creates a new identity with only the ticker populated.
    #[must_use]
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            ..Default::default()
        }
    }

    /// Sets the company name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the primary exchange.
    #[must_use]
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    /// Sets the business sector.
    #[must_use]
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Sets the industry.
    #[must_use]
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Sets the business description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the company website.
    #[must_use]
    pub fn with_website(mut self, website: impl Into<String>) -> Self {
        self.website = Some(website.into());
        self
    }

    /// Sets the SEC CIK number.
    #[must_use]
    pub fn with_cik(mut self, cik: impl Into<String>) -> Self {
        self.cik = Some(cik.into());
        self
    }

    /// Fills absent fields from another identity.
    ///
    /// A field that is already present is never overwritten, regardless of
    /// what the candidate carries. The ticker is left untouched.
    pub fn merge_missing(&mut self, other: &Self) {
        fn fill(base: &mut Option<String>, candidate: &Option<String>) {
            if base.is_none() {
                if let Some(value) = candidate {
                    *base = Some(value.clone());
                }
            }
        }

        fill(&mut self.name, &other.name);
        fill(&mut self.exchange, &other.exchange);
        fill(&mut self.sector, &other.sector);
        fill(&mut self.industry, &other.industry);
        fill(&mut self.description, &other.description);
        fill(&mut self.website, &other.website);
        fill(&mut self.cik, &other.cik);
    }
}

/// Income statement section for a single period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// Total revenue or sales.
    pub revenue: Option<f64>,
    /// Cost of goods sold (COGS).
    pub cost_of_goods_sold: Option<f64>,
    /// Gross profit (revenue - COGS).
    pub gross_profit: Option<f64>,
    /// Operating income (EBIT).
    pub operating_income: Option<f64>,
    /// Interest expense.
    pub interest_expense: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
    /// Earnings before interest, taxes, depreciation and amortization.
    pub ebitda: Option<f64>,
    /// Basic earnings per share.
    pub eps_basic: Option<f64>,
    /// Diluted earnings per share.
    pub eps_diluted: Option<f64>,
}

/// Balance sheet section for a single period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Total current assets.
    pub current_assets: Option<f64>,
    /// Cash and cash equivalents.
    pub cash_and_equivalents: Option<f64>,
    /// Inventory.
    pub inventory: Option<f64>,
    /// Accounts receivable.
    pub accounts_receivable: Option<f64>,
    /// Total liabilities.
    pub total_liabilities: Option<f64>,
    /// Total current liabilities.
    pub current_liabilities: Option<f64>,
    /// Total debt (short-term and long-term).
    pub total_debt: Option<f64>,
    /// Total shareholders' equity.
    pub shareholders_equity: Option<f64>,
    /// Shares outstanding.
    pub shares_outstanding: Option<f64>,
}

/// Cash flow statement section for a single period.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CashFlowStatement {
    /// Net cash flow from operating activities.
    pub operating_cash_flow: Option<f64>,
    /// Capital expenditures (CapEx).
    pub capital_expenditures: Option<f64>,
    /// Free cash flow (OCF - CapEx).
    pub free_cash_flow: Option<f64>,
    /// Cash paid for dividends.
    pub dividend_payments: Option<f64>,
}

/// A full financial statement for one reporting period.
///
/// Uniquely keyed by (ticker, fiscal year, period). Statements are
/// constructed once by a provider and never mutated downstream; absent
/// metrics are expressed as `None` inside the sections, never by omitting
/// the statement itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodStatement {
    /// Exchange ticker symbol.
    pub ticker: Ticker,
    /// Reporting period label.
    pub period: Period,
    /// Fiscal year.
    pub fiscal_year: i32,
    /// End date of the reporting period.
    pub end_date: NaiveDate,
    /// Income statement section.
    pub income: IncomeStatement,
    /// Balance sheet section.
    pub balance_sheet: BalanceSheet,
    /// Cash flow statement section.
    pub cash_flow: CashFlowStatement,
    /// Identifier of the source this statement was constructed from.
    pub source: String,
    /// Timestamp of retrieval.
    pub retrieved_at: DateTime<Utc>,
}

impl PeriodStatement {
    /// Creates a new statement with empty sections.
    #[must_use]
    pub fn new(
        ticker: Ticker,
        period: Period,
        fiscal_year: i32,
        end_date: NaiveDate,
        source: impl Into<String>,
    ) -> Self {
        Self {
            ticker,
            period,
            fiscal_year,
            end_date,
            income: IncomeStatement::default(),
            balance_sheet: BalanceSheet::default(),
            cash_flow: CashFlowStatement::default(),
            source: source.into(),
            retrieved_at: Utc::now(),
        }
    }
}

/// Derived accounting ratios for one reporting period.
///
/// Computed purely from a single [`PeriodStatement`]; any ratio whose inputs
/// are absent (or whose denominator is zero) is `None`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioSet {
    /// Exchange ticker symbol.
    pub ticker: Ticker,
    /// Reporting period label.
    pub period: Period,
    /// Fiscal year.
    pub fiscal_year: i32,

    // Liquidity
    /// Current assets over current liabilities.
    pub current_ratio: Option<f64>,
    /// (Current assets - inventory) over current liabilities.
    pub quick_ratio: Option<f64>,
    /// Cash and equivalents over current liabilities.
    pub cash_ratio: Option<f64>,

    // Profitability
    /// Return on equity.
    pub return_on_equity: Option<f64>,
    /// Return on assets.
    pub return_on_assets: Option<f64>,
    /// Gross profit over revenue.
    pub gross_margin: Option<f64>,
    /// Net income over revenue.
    pub net_margin: Option<f64>,
    /// EBITDA over revenue.
    pub ebitda_margin: Option<f64>,

    // Leverage
    /// Total debt over shareholders' equity.
    pub debt_to_equity: Option<f64>,
    /// Total debt over total assets.
    pub debt_to_assets: Option<f64>,
    /// Operating income over interest expense.
    pub times_interest_earned: Option<f64>,
    /// Operating cash flow over total debt (simplified coverage).
    pub debt_service_coverage: Option<f64>,

    // Efficiency
    /// Revenue over total assets.
    pub asset_turnover: Option<f64>,
    /// COGS over inventory.
    pub inventory_turnover: Option<f64>,
    /// Revenue over accounts receivable.
    pub receivables_turnover: Option<f64>,
}

impl RatioSet {
    /// Creates an empty ratio set for the given period key.
    #[must_use]
    pub fn new(ticker: Ticker, period: Period, fiscal_year: i32) -> Self {
        Self {
            ticker,
            period,
            fiscal_year,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_uppercased() {
        let ticker = Ticker::new("aapl");
        assert_eq!(ticker.as_str(), "AAPL");
        assert_eq!(ticker.to_string(), "AAPL");
    }

    #[test]
    fn test_identity_builder() {
        let identity = CompanyIdentity::new(Ticker::new("MSFT"))
            .with_name("Microsoft Corporation")
            .with_cik("0000789019");

        assert_eq!(identity.name.as_deref(), Some("Microsoft Corporation"));
        assert_eq!(identity.cik.as_deref(), Some("0000789019"));
        assert!(identity.sector.is_none());
    }

    #[test]
    fn test_merge_missing_fills_gaps_only() {
        let mut base = CompanyIdentity::new(Ticker::new("AAPL")).with_name("A");
        let candidate = CompanyIdentity::new(Ticker::new("AAPL"))
            .with_name("B")
            .with_sector("Tech");

        base.merge_missing(&candidate);

        assert_eq!(base.name.as_deref(), Some("A"));
        assert_eq!(base.sector.as_deref(), Some("Tech"));
    }

    #[test]
    fn test_merge_missing_ignores_absent_candidate_fields() {
        let mut base = CompanyIdentity::new(Ticker::new("AAPL")).with_exchange("NASDAQ");
        let candidate = CompanyIdentity::new(Ticker::new("AAPL"));

        base.merge_missing(&candidate);

        assert_eq!(base.exchange.as_deref(), Some("NASDAQ"));
        assert!(base.industry.is_none());
    }

    #[test]
    fn test_statement_sections_default_absent() {
        let stmt = PeriodStatement::new(
            Ticker::new("AAPL"),
            Period::FullYear,
            2023,
            NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
            "test",
        );

        assert!(stmt.income.revenue.is_none());
        assert!(stmt.balance_sheet.total_assets.is_none());
        assert!(stmt.cash_flow.operating_cash_flow.is_none());
        assert_eq!(stmt.period, Period::FullYear);
    }
}
