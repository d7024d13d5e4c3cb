//! Tool for fetching broader market context

use advisor_core::Result as CoreResult;
use advisor_market::{MarketGateway, Timeframe};
use advisor_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::error::Result;
use crate::tools::failure;

const INDICES: &[(&str, &str)] = &[
    ("^GSPC", "S&P 500"),
    ("^DJI", "Dow Jones"),
    ("^IXIC", "NASDAQ"),
];

const SECTOR_ETFS: &[(&str, &str)] = &[
    ("Technology", "XLK"),
    ("Healthcare", "XLV"),
    ("Financial Services", "XLF"),
    ("Consumer Cyclical", "XLY"),
    ("Industrials", "XLI"),
    ("Energy", "XLE"),
    ("Utilities", "XLU"),
    ("Real Estate", "XLRE"),
    ("Basic Materials", "XLB"),
    ("Consumer Defensive", "XLP"),
    ("Communication Services", "XLC"),
];

/// Tool: index and sector performance around a company
pub struct MarketContextTool {
    gateway: Arc<MarketGateway>,
}

#[derive(Debug, Deserialize)]
struct ContextParams {
    ticker: String,
    #[serde(default)]
    include_sector: Option<bool>,
    #[serde(default)]
    timeframe: Option<String>,
}

impl MarketContextTool {
    /// Create a new market context tool
    pub fn new(gateway: Arc<MarketGateway>) -> Self {
        Self { gateway }
    }

    async fn run(&self, params: ContextParams) -> Result<Value> {
        let timeframe = params
            .timeframe
            .as_deref()
            .and_then(Timeframe::parse)
            .unwrap_or(Timeframe::M6);

        let profile = self.gateway.profile(&params.ticker).await?;
        let sector = profile.sector.clone();

        let mut indices = Map::new();
        for (index_symbol, name) in INDICES {
            match self.gateway.price_history(index_symbol, timeframe).await {
                Ok(history) => {
                    indices.insert(
                        (*name).to_string(),
                        json!({
                            "performance": history.performance_percent(),
                            "timeframe": timeframe.as_str(),
                        }),
                    );
                }
                Err(e) => {
                    tracing::warn!("Index fetch failed for {}: {}", index_symbol, e);
                }
            }
        }

        let mut sector_performance = Value::Null;
        if params.include_sector.unwrap_or(true) {
            if let Some(etf) = sector.as_deref().and_then(sector_etf) {
                if let Ok(history) = self.gateway.price_history(etf, timeframe).await {
                    sector_performance = json!({
                        "sector": sector,
                        "etf_ticker": etf,
                        "performance": history.performance_percent(),
                        "timeframe": timeframe.as_str(),
                    });
                }
            }
        }

        Ok(json!({
            "success": true,
            "ticker": profile.symbol,
            "sector": sector,
            "industry": profile.industry,
            "timeframe": timeframe.as_str(),
            "market_indices": indices,
            "sector_performance": sector_performance,
            "tool_used": self.name(),
        }))
    }
}

fn sector_etf(sector: &str) -> Option<&'static str> {
    SECTOR_ETFS
        .iter()
        .find(|(name, _)| *name == sector)
        .map(|(_, etf)| *etf)
}

#[async_trait]
impl Tool for MarketContextTool {
    async fn execute(&self, args: Value) -> CoreResult<Value> {
        let params: ContextParams = serde_json::from_value(args).map_err(|e| {
            advisor_core::Error::InvalidToolRequest(format!("invalid parameters: {e}"))
        })?;

        match self.run(params).await {
            Ok(value) => Ok(value),
            Err(e) => Ok(failure(self.name(), e)),
        }
    }

    fn name(&self) -> &str {
        "fetch_market_context"
    }

    fn description(&self) -> &str {
        "Get broader market conditions: S&P 500, Dow Jones, and NASDAQ \
         performance over a timeframe, plus the company's sector, industry, \
         and sector-ETF performance."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "include_sector": {
                    "type": "boolean",
                    "description": "Include sector ETF performance"
                },
                "timeframe": {
                    "type": "string",
                    "enum": ["1M", "3M", "6M", "1Y"],
                    "description": "Look-back window for performance"
                }
            },
            "required": ["ticker"]
        })
    }
}
