#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finhealth/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Ratio calculation engine.
//!
//! [`calculate_ratios`] is a total function over a single
//! [`PeriodStatement`]: it never fails and carries no cross-period state.
//! Gaps in the underlying statement flow through [`safe_divide`] as absent
//! ratios.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use finhealth_core::{PeriodStatement, Period, Ticker};
//! use finhealth_ratios::calculate_ratios;
//!
//! let mut stmt = PeriodStatement::new(
//!     Ticker::new("AAPL"),
//!     Period::FullYear,
//!     2023,
//!     NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
//!     "example",
//! );
//! stmt.balance_sheet.current_assets = Some(500.0);
//! stmt.balance_sheet.current_liabilities = Some(250.0);
//!
//! let ratios = calculate_ratios(&stmt);
//! assert_eq!(ratios.current_ratio, Some(2.0));
//! assert!(ratios.net_margin.is_none());
//! ```

use finhealth_core::{PeriodStatement, RatioSet};
use tracing::debug;

/// Divides two optional values, absorbing gaps and zero denominators.
///
/// Returns `None` if either operand is absent or the denominator is zero.
/// This single rule governs every derived ratio; there is no other
/// error-avoidance mechanism in the engine.
#[must_use]
pub fn safe_divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => Some(n / d),
        _ => None,
    }
}

/// Calculates the full ratio set for a single period statement.
///
/// Total function: absent or zero inputs produce absent ratios, never an
/// error. Turnover ratios use period-end balances rather than period
/// averages; this mirrors the source data deliberately, since switching to
/// averages would silently change every ratio output.
#[must_use]
pub fn calculate_ratios(statement: &PeriodStatement) -> RatioSet {
    debug!(
        ticker = %statement.ticker,
        fiscal_year = statement.fiscal_year,
        "Calculating ratios"
    );

    let income = &statement.income;
    let balance = &statement.balance_sheet;
    let cash_flow = &statement.cash_flow;

    let mut ratios = RatioSet::new(
        statement.ticker.clone(),
        statement.period,
        statement.fiscal_year,
    );

    // Liquidity
    ratios.current_ratio = safe_divide(balance.current_assets, balance.current_liabilities);
    let quick_assets = match (balance.current_assets, balance.inventory) {
        (Some(ca), Some(inv)) => Some(ca - inv),
        _ => None,
    };
    ratios.quick_ratio = safe_divide(quick_assets, balance.current_liabilities);
    ratios.cash_ratio = safe_divide(balance.cash_and_equivalents, balance.current_liabilities);

    // Profitability
    ratios.return_on_equity = safe_divide(income.net_income, balance.shareholders_equity);
    ratios.return_on_assets = safe_divide(income.net_income, balance.total_assets);
    ratios.gross_margin = safe_divide(income.gross_profit, income.revenue);
    ratios.net_margin = safe_divide(income.net_income, income.revenue);
    ratios.ebitda_margin = safe_divide(income.ebitda, income.revenue);

    // Leverage
    ratios.debt_to_equity = safe_divide(balance.total_debt, balance.shareholders_equity);
    ratios.debt_to_assets = safe_divide(balance.total_debt, balance.total_assets);
    ratios.times_interest_earned = safe_divide(income.operating_income, income.interest_expense);
    // Simplified coverage; a fuller version would use scheduled debt payments.
    ratios.debt_service_coverage = safe_divide(cash_flow.operating_cash_flow, balance.total_debt);

    // Efficiency, using year-end balances rather than period averages
    ratios.asset_turnover = safe_divide(income.revenue, balance.total_assets);
    ratios.inventory_turnover = safe_divide(income.cost_of_goods_sold, balance.inventory);
    ratios.receivables_turnover = safe_divide(income.revenue, balance.accounts_receivable);

    ratios
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use finhealth_core::{Period, Ticker};

    fn statement() -> PeriodStatement {
        PeriodStatement::new(
            Ticker::new("TEST"),
            Period::FullYear,
            2023,
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            "test",
        )
    }

    #[test]
    fn test_safe_divide() {
        assert_eq!(safe_divide(Some(500.0), Some(250.0)), Some(2.0));
        assert_eq!(safe_divide(Some(1.0), Some(0.0)), None);
        assert_eq!(safe_divide(None, Some(1.0)), None);
        assert_eq!(safe_divide(Some(1.0), None), None);
        assert_eq!(safe_divide(None, None), None);
    }

    #[test]
    fn test_safe_divide_negative_values() {
        assert_eq!(safe_divide(Some(-100.0), Some(200.0)), Some(-0.5));
    }

    #[test]
    fn test_full_ratio_set() {
        let mut stmt = statement();
        stmt.balance_sheet.current_assets = Some(500.0);
        stmt.balance_sheet.current_liabilities = Some(250.0);
        stmt.balance_sheet.total_debt = Some(800.0);
        stmt.balance_sheet.shareholders_equity = Some(1000.0);
        stmt.income.revenue = Some(1000.0);
        stmt.income.net_income = Some(100.0);

        let ratios = calculate_ratios(&stmt);

        assert_eq!(ratios.current_ratio, Some(2.0));
        assert_eq!(ratios.net_margin, Some(0.10));
        assert_eq!(ratios.debt_to_equity, Some(0.8));
    }

    #[test]
    fn test_missing_metric_yields_absent_ratio() {
        let mut stmt = statement();
        stmt.income.revenue = Some(1000.0);
        // No inventory, no COGS: both inventory-dependent ratios absent.
        let ratios = calculate_ratios(&stmt);

        assert!(ratios.inventory_turnover.is_none());
        assert!(ratios.quick_ratio.is_none());
        assert!(ratios.gross_margin.is_none());
    }

    #[test]
    fn test_quick_ratio_requires_inventory() {
        let mut stmt = statement();
        stmt.balance_sheet.current_assets = Some(500.0);
        stmt.balance_sheet.current_liabilities = Some(200.0);
        // Inventory absent: quick ratio is absent even though current ratio exists.
        let ratios = calculate_ratios(&stmt);
        assert_eq!(ratios.current_ratio, Some(2.5));
        assert!(ratios.quick_ratio.is_none());

        stmt.balance_sheet.inventory = Some(100.0);
        let ratios = calculate_ratios(&stmt);
        assert_eq!(ratios.quick_ratio, Some(2.0));
    }

    #[test]
    fn test_zero_denominator_absorbed() {
        let mut stmt = statement();
        stmt.income.net_income = Some(100.0);
        stmt.balance_sheet.shareholders_equity = Some(0.0);

        let ratios = calculate_ratios(&stmt);
        assert!(ratios.return_on_equity.is_none());
    }

    #[test]
    fn test_ratio_set_carries_period_key() {
        let stmt = statement();
        let ratios = calculate_ratios(&stmt);

        assert_eq!(ratios.ticker, Ticker::new("TEST"));
        assert_eq!(ratios.period, Period::FullYear);
        assert_eq!(ratios.fiscal_year, 2023);
    }
}
