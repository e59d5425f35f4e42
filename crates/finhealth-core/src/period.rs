//! Reporting period definitions.
//!
//! This module defines [`Period`], the label identifying which reporting
//! period a statement covers. Statements are keyed by
//! (ticker, fiscal year, period).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reporting period covered by a financial statement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Full fiscal year ("FY").
    #[default]
    FullYear,
    /// A fiscal quarter (1-4).
    Quarter(u8),
}

impl Period {
    /// Returns true if this period covers a full fiscal year.
    #[must_use]
    pub const fn is_full_year(&self) -> bool {
        matches!(self, Self::FullYear)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullYear => write!(f, "FY"),
            Self::Quarter(q) => write!(f, "Q{q}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_labels() {
        assert_eq!(Period::FullYear.to_string(), "FY");
        assert_eq!(Period::Quarter(2).to_string(), "Q2");
        assert!(Period::FullYear.is_full_year());
        assert!(!Period::Quarter(1).is_full_year());
    }
}
