//! Tool for fetching quarterly financial data

use advisor_core::Result as CoreResult;
use advisor_market::{MarketGateway, QuarterlySeries};
use advisor_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::error::Result;
use crate::tools::failure;

const DEFAULT_QUARTERS: usize = 8;
const MAX_QUARTERS: usize = 12;

const DEFAULT_METRICS: &[&str] = &[
    "revenue",
    "net_income",
    "free_cash_flow",
    "total_debt",
    "total_cash",
];

/// Tool: fetch quarterly statements with QoQ/YoY growth enrichment
pub struct QuarterlyDataTool {
    gateway: Arc<MarketGateway>,
}

#[derive(Debug, Deserialize)]
struct QuarterlyParams {
    ticker: String,
    #[serde(default)]
    quarters: Option<usize>,
    #[serde(default)]
    metrics: Option<Vec<String>>,
}

impl QuarterlyDataTool {
    /// Create a new quarterly data tool
    pub fn new(gateway: Arc<MarketGateway>) -> Self {
        Self { gateway }
    }

    /// Fetch the merged, growth-enriched series for the last `quarters`
    ///
    /// Also used directly by the fallback analyzer.
    pub async fn fetch_series(&self, ticker: &str, quarters: usize) -> Result<QuarterlySeries> {
        let series = self.gateway.merged_quarterly(ticker).await?;
        Ok(series.with_growth().take(quarters.clamp(1, MAX_QUARTERS)))
    }

    async fn run(&self, params: QuarterlyParams) -> Result<Value> {
        let quarters = params.quarters.unwrap_or(DEFAULT_QUARTERS);
        let metrics: Vec<String> = params
            .metrics
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_METRICS.iter().map(|&m| m.to_string()).collect());

        let series = self.fetch_series(&params.ticker, quarters).await?;

        let data: Vec<Value> = series
            .quarters
            .iter()
            .map(|quarter| {
                let mut entry = Map::new();
                entry.insert("period".to_string(), json!(quarter.period));
                for metric in &metrics {
                    entry.insert(metric.clone(), json!(quarter.metric(metric)));
                }
                let pick = |growth: &std::collections::BTreeMap<String, f64>| -> Value {
                    json!(
                        growth
                            .iter()
                            .filter(|(k, _)| metrics.iter().any(|m| m == k.as_str()))
                            .collect::<std::collections::BTreeMap<_, _>>()
                    )
                };
                entry.insert("growth_qoq".to_string(), pick(&quarter.growth_qoq));
                entry.insert("growth_yoy".to_string(), pick(&quarter.growth_yoy));
                Value::Object(entry)
            })
            .collect();

        Ok(json!({
            "success": true,
            "ticker": series.symbol,
            "quarters": data.len(),
            "data": data,
            "tool_used": self.name(),
        }))
    }
}

#[async_trait]
impl Tool for QuarterlyDataTool {
    async fn execute(&self, args: Value) -> CoreResult<Value> {
        let params: QuarterlyParams = serde_json::from_value(args).map_err(|e| {
            advisor_core::Error::InvalidToolRequest(format!("invalid parameters: {e}"))
        })?;

        match self.run(params).await {
            Ok(value) => Ok(value),
            Err(e) => Ok(failure(self.name(), e)),
        }
    }

    fn name(&self) -> &str {
        "fetch_quarterly_data"
    }

    fn description(&self) -> &str {
        "Fetch quarterly financial data for recent periods: revenue, income, \
         cash flow, and balance sheet metrics with quarter-over-quarter and \
         year-over-year growth rates."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "quarters": {
                    "type": "integer",
                    "description": "Number of quarters to fetch",
                    "minimum": 1,
                    "maximum": 12
                },
                "metrics": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Specific metrics to fetch (revenue, net_income, free_cash_flow, total_debt, total_cash, ...)"
                }
            },
            "required": ["ticker"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testutil::{StaticSource, gateway};
    use advisor_market::{Operation, QuarterPoint, QuarterlySeries};

    fn series(symbol: &str, revenues: &[f64]) -> QuarterlySeries {
        QuarterlySeries {
            symbol: symbol.to_string(),
            quarters: revenues
                .iter()
                .enumerate()
                .map(|(i, &revenue)| QuarterPoint {
                    period: format!("2025-Q{}", 4 - i),
                    revenue: Some(revenue),
                    net_income: Some(revenue * 0.2),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn tool_with_income(symbol: &str, revenues: &[f64]) -> QuarterlyDataTool {
        let source = StaticSource::new()
            .with(symbol, Operation::QuarterlyIncome, series(symbol, revenues))
            .with(
                symbol,
                Operation::QuarterlyCashFlow,
                QuarterlySeries::default(),
            )
            .with(
                symbol,
                Operation::QuarterlyBalanceSheet,
                QuarterlySeries::default(),
            );
        QuarterlyDataTool::new(gateway(source))
    }

    #[test]
    fn test_tool_metadata() {
        let tool = tool_with_income("AAPL", &[100.0]);
        assert_eq!(tool.name(), "fetch_quarterly_data");
        assert!(!tool.description().is_empty());
        assert_eq!(tool.input_schema()["required"][0], "ticker");
    }

    #[tokio::test]
    async fn test_fetch_with_growth() {
        let tool = tool_with_income("AAPL", &[110.0, 100.0, 95.0]);

        let result = tool
            .execute(json!({"ticker": "AAPL", "quarters": 2}))
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["ticker"], "AAPL");
        assert_eq!(result["quarters"], 2);
        assert_eq!(result["data"][0]["revenue"], 110.0);
        assert_eq!(result["data"][0]["growth_qoq"]["revenue"], 10.0);
    }

    #[tokio::test]
    async fn test_metric_selection() {
        let tool = tool_with_income("AAPL", &[110.0, 100.0]);

        let result = tool
            .execute(json!({"ticker": "AAPL", "metrics": ["revenue"]}))
            .await
            .unwrap();

        let first = &result["data"][0];
        assert!(first.get("revenue").is_some());
        assert!(first.get("net_income").is_none());
    }

    #[tokio::test]
    async fn test_unknown_symbol_reports_structured_failure() {
        let tool = tool_with_income("AAPL", &[100.0]);

        let result = tool.execute(json!({"ticker": "ZZZZZZ"})).await.unwrap();
        assert_eq!(result["success"], false);
        assert!(result["error"].as_str().unwrap().contains("ZZZZZZ"));
    }
}
