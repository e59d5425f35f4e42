#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/finhealth/finhealth/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for financial statement providers.
//!
//! This crate provides the foundational abstractions for acquiring and
//! normalizing company financial data:
//!
//! - [`FinancialDataProvider`](provider::FinancialDataProvider) - Contract for all data sources
//! - [`ResponseCache`](cache::ResponseCache) - Read-through caching abstraction
//! - [`CompanyIdentity`](types::CompanyIdentity) - Additively-built company metadata
//! - [`PeriodStatement`](types::PeriodStatement) - One period's normalized statements
//! - [`RatioSet`](types::RatioSet) - Derived ratios for one period

/// Cache trait for raw upstream responses.
pub mod cache;
/// Error types for data acquisition.
pub mod error;
/// Reporting period definitions.
pub mod period;
/// Provider trait for fetching company financial data.
pub mod provider;
/// Canonical data types (Ticker, statements, ratios, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::ResponseCache;
pub use error::{ProviderError, Result, ServiceError};
pub use period::Period;
pub use provider::FinancialDataProvider;
pub use types::{
    BalanceSheet, CashFlowStatement, CompanyIdentity, IncomeStatement, PeriodStatement, RatioSet,
    Ticker,
};
