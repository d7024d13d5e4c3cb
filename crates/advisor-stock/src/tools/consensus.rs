//! Tool for fetching analyst consensus

use advisor_core::Result as CoreResult;
use advisor_market::MarketGateway;
use advisor_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::Result;
use crate::tools::{failure, round2, safe_ratio};

/// Tool: analyst price targets and recommendation distribution
pub struct AnalystConsensusTool {
    gateway: Arc<MarketGateway>,
}

#[derive(Debug, Deserialize)]
struct ConsensusParams {
    ticker: String,
}

impl AnalystConsensusTool {
    /// Create a new consensus tool
    pub fn new(gateway: Arc<MarketGateway>) -> Self {
        Self { gateway }
    }

    async fn run(&self, params: ConsensusParams) -> Result<Value> {
        let consensus = self.gateway.consensus(&params.ticker).await?;

        // Upside of the mean target over the current price, percent
        let upside = safe_ratio(
            consensus
                .mean_target
                .zip(consensus.current_price)
                .map(|(target, price)| target - price),
            consensus.current_price,
        )
        .map(|r| round2(r * 100.0));

        Ok(json!({
            "success": true,
            "ticker": consensus.symbol,
            "consensus": {
                "current_price": consensus.current_price,
                "analyst_targets": {
                    "mean_target": consensus.mean_target,
                    "high_target": consensus.high_target,
                    "low_target": consensus.low_target,
                    "number_of_analysts": consensus.analyst_count,
                },
                "recommendations": {
                    "key": consensus.recommendation_key,
                    "strong_buy": consensus.strong_buy,
                    "buy": consensus.buy,
                    "hold": consensus.hold,
                    "sell": consensus.sell,
                    "strong_sell": consensus.strong_sell,
                },
                "upside_percent": upside,
            },
            "tool_used": self.name(),
        }))
    }
}

#[async_trait]
impl Tool for AnalystConsensusTool {
    async fn execute(&self, args: Value) -> CoreResult<Value> {
        let params: ConsensusParams = serde_json::from_value(args).map_err(|e| {
            advisor_core::Error::InvalidToolRequest(format!("invalid parameters: {e}"))
        })?;

        match self.run(params).await {
            Ok(value) => Ok(value),
            Err(e) => Ok(failure(self.name(), e)),
        }
    }

    fn name(&self) -> &str {
        "get_analyst_consensus"
    }

    fn description(&self) -> &str {
        "Get analyst ratings, price targets (mean/high/low), the \
         recommendation distribution, and the implied upside versus the \
         current price."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
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
    use advisor_market::{AnalystConsensus, Operation};

    #[tokio::test]
    async fn test_consensus_with_upside() {
        let source = StaticSource::new().with(
            "AAPL",
            Operation::AnalystConsensus,
            AnalystConsensus {
                symbol: "AAPL".to_string(),
                current_price: Some(200.0),
                mean_target: Some(230.0),
                high_target: Some(260.0),
                low_target: Some(170.0),
                analyst_count: Some(38),
                recommendation_key: Some("buy".to_string()),
                strong_buy: Some(12),
                buy: Some(20),
                hold: Some(5),
                sell: Some(1),
                strong_sell: Some(0),
            },
        );
        let tool = AnalystConsensusTool::new(gateway(source));

        let result = tool.execute(json!({"ticker": "AAPL"})).await.unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["consensus"]["analyst_targets"]["mean_target"], 230.0);
        assert_eq!(result["consensus"]["recommendations"]["strong_buy"], 12);
        assert_eq!(result["consensus"]["upside_percent"], 15.0);
    }

    #[tokio::test]
    async fn test_missing_price_leaves_upside_absent() {
        let source = StaticSource::new().with(
            "AAPL",
            Operation::AnalystConsensus,
            AnalystConsensus {
                symbol: "AAPL".to_string(),
                mean_target: Some(230.0),
                ..Default::default()
            },
        );
        let tool = AnalystConsensusTool::new(gateway(source));

        let result = tool.execute(json!({"ticker": "AAPL"})).await.unwrap();
        assert!(result["consensus"]["upside_percent"].is_null());
    }

    #[test]
    fn test_tool_metadata() {
        let tool = AnalystConsensusTool::new(gateway(StaticSource::new()));
        assert_eq!(tool.name(), "get_analyst_consensus");
    }
}
