//! Upstream market-data source trait and the fixed operation set

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Look-back window for price history fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// One month
    M1,
    /// Three months
    M3,
    /// Six months
    M6,
    /// One year
    Y1,
}

impl Timeframe {
    /// Wire label as used in tool arguments ("1M", "3M", "6M", "1Y")
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::M1 => "1M",
            Self::M3 => "3M",
            Self::M6 => "6M",
            Self::Y1 => "1Y",
        }
    }

    /// Parse a wire label
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "1M" => Some(Self::M1),
            "3M" => Some(Self::M3),
            "6M" => Some(Self::M6),
            "1Y" => Some(Self::Y1),
            _ => None,
        }
    }

    /// Approximate number of calendar days covered
    pub fn days(&self) -> u32 {
        match self {
            Self::M1 => 30,
            Self::M3 => 90,
            Self::M6 => 180,
            Self::Y1 => 365,
        }
    }
}

/// The fixed set of upstream query kinds
///
/// Every gateway fetch names one of these; together with the ticker they
/// form the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Company profile, key statistics, and current valuation fields
    CompanyProfile,
    /// Annual income statement, latest period
    IncomeStatement,
    /// Annual balance sheet, latest period
    BalanceSheet,
    /// Annual cash flow statement, latest period
    CashFlow,
    /// Quarterly income statements, newest first
    QuarterlyIncome,
    /// Quarterly cash flow statements, newest first
    QuarterlyCashFlow,
    /// Quarterly balance sheets, newest first
    QuarterlyBalanceSheet,
    /// Analyst price targets and recommendation distribution
    AnalystConsensus,
    /// Daily closing prices over a timeframe
    PriceHistory(Timeframe),
}

impl Operation {
    /// Stable operation name used in cache keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyProfile => "company_profile",
            Self::IncomeStatement => "income_statement",
            Self::BalanceSheet => "balance_sheet",
            Self::CashFlow => "cash_flow",
            Self::QuarterlyIncome => "quarterly_income",
            Self::QuarterlyCashFlow => "quarterly_cash_flow",
            Self::QuarterlyBalanceSheet => "quarterly_balance_sheet",
            Self::AnalystConsensus => "analyst_consensus",
            Self::PriceHistory(Timeframe::M1) => "price_history_1m",
            Self::PriceHistory(Timeframe::M3) => "price_history_3m",
            Self::PriceHistory(Timeframe::M6) => "price_history_6m",
            Self::PriceHistory(Timeframe::Y1) => "price_history_1y",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for the upstream market-data service
///
/// Implementations fetch one operation for one symbol and normalize the
/// raw response into the payload model from [`crate::model`], serialized
/// as JSON for caching. Only the gateway calls this trait.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch one operation's payload for a symbol
    async fn fetch(&self, symbol: &str, operation: Operation) -> Result<Value>;

    /// Get the source name (e.g. "yahoo")
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_names_are_distinct() {
        let ops = [
            Operation::CompanyProfile,
            Operation::IncomeStatement,
            Operation::BalanceSheet,
            Operation::CashFlow,
            Operation::QuarterlyIncome,
            Operation::QuarterlyCashFlow,
            Operation::QuarterlyBalanceSheet,
            Operation::AnalystConsensus,
            Operation::PriceHistory(Timeframe::M6),
            Operation::PriceHistory(Timeframe::Y1),
        ];

        let names: std::collections::HashSet<_> = ops.iter().map(Operation::as_str).collect();
        assert_eq!(names.len(), ops.len());
    }

    #[test]
    fn test_timeframe_roundtrip() {
        for label in ["1M", "3M", "6M", "1Y"] {
            let tf = Timeframe::parse(label).unwrap();
            assert_eq!(tf.as_str(), label);
        }
        assert!(Timeframe::parse("2W").is_none());
        assert_eq!(Timeframe::M6.days(), 180);
    }
}
