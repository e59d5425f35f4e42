#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Unified financial statement acquisition and ratio pipeline.
//!
//! This crate re-exports the canonical data model and provider
//! implementations, and provides a [`FinancialDataService`] for coordinating
//! multiple providers with fallback and identity enrichment.
//!
//! # Features
//!
//! - `edgar` - SEC EDGAR structured-filing provider
//! - `yahoo` - Yahoo Finance market-data provider
//! - `cache-sqlite` - SQLite-based response caching
//!
//! # Example
//!
//! ```rust,ignore
//! use finhealth::{calculate_ratios, FinancialDataService, Ticker};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = FinancialDataService::new()
//!         .with_edgar("MyApp/1.0 (contact@example.com)")
//!         .with_yahoo();
//!
//!     let ticker = Ticker::new("AAPL");
//!     let (identity, statements) = service.fetch_company_financials(&ticker, 5).await?;
//!
//!     println!("{:?}", identity.name);
//!     for statement in &statements {
//!         let ratios = calculate_ratios(statement);
//!         println!("{} {:?}", statement.fiscal_year, ratios.current_ratio);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use finhealth_core::*;

// Ratio engine
pub use finhealth_ratios::{calculate_ratios, safe_divide};

// Cache implementations
#[cfg(feature = "cache-sqlite")]
pub use finhealth_cache::SqliteCache;
pub use finhealth_cache::{InMemoryCache, NoopCache};

// Providers
#[cfg(feature = "edgar")]
pub use finhealth_edgar::EdgarProvider;
#[cfg(feature = "yahoo")]
pub use finhealth_yahoo::YahooProvider;

mod service;
pub use service::FinancialDataService;
