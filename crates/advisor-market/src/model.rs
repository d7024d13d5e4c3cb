//! Normalized market-data payloads
//!
//! Upstream responses are normalized into these shapes by the source
//! implementation, serialized to JSON for caching, and deserialized again
//! by the tools that consume them. All monetary fields are optional:
//! upstream statements are frequently sparse and a missing line item must
//! stay missing rather than becoming zero.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Company profile and current valuation snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub exchange: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,

    pub current_price: Option<f64>,
    pub market_cap: Option<f64>,
    pub enterprise_value: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub beta: Option<f64>,
    pub dividend_yield: Option<f64>,

    pub total_revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub net_income: Option<f64>,
    pub eps_trailing: Option<f64>,
    pub eps_forward: Option<f64>,

    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub pb_ratio: Option<f64>,
    pub ps_ratio: Option<f64>,
    pub peg_ratio: Option<f64>,

    pub profit_margin: Option<f64>,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_assets: Option<f64>,
}

/// One annual financial statement, latest period
///
/// A single shape covers income statement, balance sheet, and cash flow;
/// the operation determines which fields are populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub symbol: String,
    /// Fiscal period end date (YYYY-MM-DD)
    pub period: Option<String>,

    // Income statement
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub ebitda: Option<f64>,

    // Balance sheet
    pub total_assets: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_cash: Option<f64>,
    pub stockholders_equity: Option<f64>,
    pub current_assets: Option<f64>,
    pub current_liabilities: Option<f64>,
    pub inventory: Option<f64>,

    // Cash flow
    pub operating_cash_flow: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub capital_expenditures: Option<f64>,
}

/// One quarter's worth of merged financial metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuarterPoint {
    /// Quarter end date (YYYY-MM-DD)
    pub period: String,

    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub ebitda: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub capital_expenditures: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_debt: Option<f64>,
    pub total_cash: Option<f64>,
    pub stockholders_equity: Option<f64>,

    /// Quarter-over-quarter growth per metric, percent
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub growth_qoq: BTreeMap<String, f64>,

    /// Year-over-year growth per metric, percent
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub growth_yoy: BTreeMap<String, f64>,
}

impl QuarterPoint {
    /// Metric names addressable by name in tool arguments
    pub const METRICS: &'static [&'static str] = &[
        "revenue",
        "gross_profit",
        "operating_income",
        "net_income",
        "ebitda",
        "operating_cash_flow",
        "free_cash_flow",
        "capital_expenditures",
        "total_assets",
        "total_debt",
        "total_cash",
        "stockholders_equity",
    ];

    /// Look up a metric value by name
    pub fn metric(&self, name: &str) -> Option<f64> {
        match name {
            "revenue" => self.revenue,
            "gross_profit" => self.gross_profit,
            "operating_income" => self.operating_income,
            "net_income" => self.net_income,
            "ebitda" => self.ebitda,
            "operating_cash_flow" => self.operating_cash_flow,
            "free_cash_flow" => self.free_cash_flow,
            "capital_expenditures" => self.capital_expenditures,
            "total_assets" => self.total_assets,
            "total_debt" => self.total_debt,
            "total_cash" => self.total_cash,
            "stockholders_equity" => self.stockholders_equity,
            _ => None,
        }
    }
}

/// Quarterly metric series, newest quarter first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuarterlySeries {
    pub symbol: String,
    pub quarters: Vec<QuarterPoint>,
}

impl QuarterlySeries {
    /// Merge income, cash-flow, and balance-sheet series by quarter index
    ///
    /// The income series drives the period labels; the other two series are
    /// aligned positionally (all sources report newest first).
    pub fn merge(income: Self, cash_flow: Self, balance: Self) -> Self {
        let mut quarters = income.quarters;
        for (i, quarter) in quarters.iter_mut().enumerate() {
            if let Some(cf) = cash_flow.quarters.get(i) {
                quarter.operating_cash_flow = cf.operating_cash_flow;
                quarter.free_cash_flow = cf.free_cash_flow;
                quarter.capital_expenditures = cf.capital_expenditures;
            }
            if let Some(bs) = balance.quarters.get(i) {
                quarter.total_assets = bs.total_assets;
                quarter.total_debt = bs.total_debt;
                quarter.total_cash = bs.total_cash;
                quarter.stockholders_equity = bs.stockholders_equity;
            }
        }
        Self {
            symbol: income.symbol,
            quarters,
        }
    }

    /// Compute QoQ and YoY growth rates for every metric of every quarter
    ///
    /// Growth is `(current - previous) / |previous| * 100`, rounded to two
    /// decimals; quarters[i] compares against quarters[i+1] (QoQ) and
    /// quarters[i+4] (YoY). Metrics missing in either quarter, or with a
    /// zero base, produce no growth entry.
    pub fn with_growth(mut self) -> Self {
        let snapshot = self.quarters.clone();
        for (i, quarter) in self.quarters.iter_mut().enumerate() {
            quarter.growth_qoq = growth_against(quarter, snapshot.get(i + 1));
            quarter.growth_yoy = growth_against(quarter, snapshot.get(i + 4));
        }
        self
    }

    /// Truncate to the newest `n` quarters
    pub fn take(mut self, n: usize) -> Self {
        self.quarters.truncate(n);
        self
    }
}

fn growth_against(current: &QuarterPoint, base: Option<&QuarterPoint>) -> BTreeMap<String, f64> {
    let Some(base) = base else {
        return BTreeMap::new();
    };

    QuarterPoint::METRICS
        .iter()
        .filter_map(|&name| {
            let now = current.metric(name)?;
            let then = base.metric(name)?;
            if then == 0.0 {
                return None;
            }
            let growth = (now - then) / then.abs() * 100.0;
            growth.is_finite().then(|| (name.to_string(), round2(growth)))
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Analyst price targets and recommendation distribution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalystConsensus {
    pub symbol: String,
    pub current_price: Option<f64>,
    pub mean_target: Option<f64>,
    pub high_target: Option<f64>,
    pub low_target: Option<f64>,
    pub analyst_count: Option<u32>,
    pub recommendation_key: Option<String>,
    pub strong_buy: Option<u32>,
    pub buy: Option<u32>,
    pub hold: Option<u32>,
    pub sell: Option<u32>,
    pub strong_sell: Option<u32>,
}

/// One daily closing price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading day (YYYY-MM-DD)
    pub date: String,
    pub close: f64,
}

/// Daily closing prices over a timeframe, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub points: Vec<PricePoint>,
}

impl PriceHistory {
    /// Percent change from the first to the last close
    pub fn performance_percent(&self) -> Option<f64> {
        let first = self.points.first()?.close;
        let last = self.points.last()?.close;
        if first == 0.0 {
            return None;
        }
        let change = (last - first) / first * 100.0;
        change.is_finite().then(|| round2(change))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quarter(period: &str, revenue: Option<f64>, net_income: Option<f64>) -> QuarterPoint {
        QuarterPoint {
            period: period.to_string(),
            revenue,
            net_income,
            ..Default::default()
        }
    }

    #[test]
    fn test_metric_lookup() {
        let q = quarter("2025-06-30", Some(100.0), Some(20.0));
        assert_eq!(q.metric("revenue"), Some(100.0));
        assert_eq!(q.metric("net_income"), Some(20.0));
        assert_eq!(q.metric("ebitda"), None);
        assert_eq!(q.metric("nonsense"), None);
    }

    #[test]
    fn test_growth_qoq_and_yoy() {
        let series = QuarterlySeries {
            symbol: "AAPL".to_string(),
            quarters: vec![
                quarter("2025-06-30", Some(110.0), Some(22.0)),
                quarter("2025-03-31", Some(100.0), Some(20.0)),
                quarter("2024-12-31", Some(95.0), None),
                quarter("2024-09-30", Some(90.0), Some(18.0)),
                quarter("2024-06-30", Some(88.0), Some(16.0)),
            ],
        }
        .with_growth();

        let latest = &series.quarters[0];
        assert_eq!(latest.growth_qoq.get("revenue"), Some(&10.0));
        assert_eq!(latest.growth_qoq.get("net_income"), Some(&10.0));
        assert_eq!(latest.growth_yoy.get("revenue"), Some(&25.0));
        assert_eq!(latest.growth_yoy.get("net_income"), Some(&37.5));

        // Second-newest quarter has a QoQ partner but no YoY partner
        let second = &series.quarters[1];
        assert!(second.growth_qoq.contains_key("revenue"));
        assert!(second.growth_yoy.is_empty());
        // Missing base value produces no entry
        assert!(!second.growth_qoq.contains_key("net_income"));
    }

    #[test]
    fn test_growth_skips_zero_base() {
        let series = QuarterlySeries {
            symbol: "X".to_string(),
            quarters: vec![
                quarter("2025-06-30", Some(50.0), None),
                quarter("2025-03-31", Some(0.0), None),
            ],
        }
        .with_growth();

        assert!(!series.quarters[0].growth_qoq.contains_key("revenue"));
    }

    #[test]
    fn test_merge_aligns_by_index() {
        let income = QuarterlySeries {
            symbol: "AAPL".to_string(),
            quarters: vec![quarter("2025-06-30", Some(100.0), Some(20.0))],
        };
        let cash_flow = QuarterlySeries {
            symbol: "AAPL".to_string(),
            quarters: vec![QuarterPoint {
                period: "2025-06-30".to_string(),
                operating_cash_flow: Some(30.0),
                free_cash_flow: Some(25.0),
                ..Default::default()
            }],
        };
        let balance = QuarterlySeries {
            symbol: "AAPL".to_string(),
            quarters: vec![QuarterPoint {
                period: "2025-06-30".to_string(),
                total_debt: Some(40.0),
                total_cash: Some(60.0),
                ..Default::default()
            }],
        };

        let merged = QuarterlySeries::merge(income, cash_flow, balance);
        let q = &merged.quarters[0];
        assert_eq!(q.revenue, Some(100.0));
        assert_eq!(q.free_cash_flow, Some(25.0));
        assert_eq!(q.total_debt, Some(40.0));
    }

    #[test]
    fn test_price_history_performance() {
        let history = PriceHistory {
            symbol: "^GSPC".to_string(),
            points: vec![
                PricePoint {
                    date: "2025-01-02".to_string(),
                    close: 100.0,
                },
                PricePoint {
                    date: "2025-06-30".to_string(),
                    close: 112.5,
                },
            ],
        };
        assert_eq!(history.performance_percent(), Some(12.5));

        let empty = PriceHistory::default();
        assert!(empty.performance_percent().is_none());
    }
}
