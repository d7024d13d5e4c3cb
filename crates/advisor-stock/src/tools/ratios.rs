//! Tool for calculating financial ratios

use advisor_core::Result as CoreResult;
use advisor_market::{CompanyProfile, FinancialStatement, MarketGateway, Operation};
use advisor_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::error::Result;
use crate::tools::{failure, safe_ratio};

/// Tool: calculate requested valuation, profitability, liquidity, and
/// leverage ratios
///
/// A ratio whose denominator is missing or zero reports as `null` rather
/// than being computed; the remaining ratios in the same call are
/// unaffected.
pub struct FinancialRatiosTool {
    gateway: Arc<MarketGateway>,
}

#[derive(Debug, Deserialize)]
struct RatiosParams {
    ticker: String,
    ratios: Vec<String>,
}

impl FinancialRatiosTool {
    /// Create a new ratios tool
    pub fn new(gateway: Arc<MarketGateway>) -> Self {
        Self { gateway }
    }

    async fn run(&self, params: RatiosParams) -> Result<Value> {
        let profile = self.gateway.profile(&params.ticker).await?;
        // Statement fetches are best-effort; their ratios just report absent
        let balance = self
            .gateway
            .statement(&params.ticker, Operation::BalanceSheet)
            .await
            .unwrap_or_default();
        let income = self
            .gateway
            .statement(&params.ticker, Operation::IncomeStatement)
            .await
            .unwrap_or_default();

        let mut ratios = Map::new();
        for name in &params.ratios {
            ratios.insert(name.clone(), json!(compute(name, &profile, &income, &balance)));
        }

        Ok(json!({
            "success": true,
            "ticker": profile.symbol,
            "ratios": ratios,
            "tool_used": self.name(),
        }))
    }
}

fn compute(
    name: &str,
    profile: &CompanyProfile,
    income: &FinancialStatement,
    balance: &FinancialStatement,
) -> Option<f64> {
    match name {
        "P/E" => profile.pe_ratio,
        "Forward_P/E" => profile.forward_pe,
        "P/B" => profile.pb_ratio,
        "P/S" => profile.ps_ratio,
        "PEG" => profile.peg_ratio,
        "ROE" => profile.return_on_equity,
        "ROA" => profile.return_on_assets,
        "Net_Margin" => profile.profit_margin,
        "Gross_Margin" => profile.gross_margin,
        "Operating_Margin" => profile.operating_margin,
        "Current_Ratio" => safe_ratio(balance.current_assets, balance.current_liabilities),
        "Quick_Ratio" => {
            let quick_assets = balance
                .current_assets
                .map(|assets| assets - balance.inventory.unwrap_or(0.0));
            safe_ratio(quick_assets, balance.current_liabilities)
        }
        "Debt_to_Equity" => safe_ratio(balance.total_debt, balance.stockholders_equity),
        "Debt_to_Assets" => safe_ratio(balance.total_debt, balance.total_assets),
        "Asset_Turnover" => safe_ratio(income.revenue, balance.total_assets),
        "EV_Revenue" => safe_ratio(profile.enterprise_value, profile.total_revenue),
        "EV_EBITDA" => safe_ratio(profile.enterprise_value, profile.ebitda),
        _ => None,
    }
}

#[async_trait]
impl Tool for FinancialRatiosTool {
    async fn execute(&self, args: Value) -> CoreResult<Value> {
        let params: RatiosParams = serde_json::from_value(args).map_err(|e| {
            advisor_core::Error::InvalidToolRequest(format!("invalid parameters: {e}"))
        })?;

        match self.run(params).await {
            Ok(value) => Ok(value),
            Err(e) => Ok(failure(self.name(), e)),
        }
    }

    fn name(&self) -> &str {
        "calculate_financial_ratios"
    }

    fn description(&self) -> &str {
        "Calculate specific financial ratios: valuation (P/E, P/B, P/S, PEG, \
         EV_Revenue, EV_EBITDA), profitability (ROE, ROA, margins), \
         liquidity (Current_Ratio, Quick_Ratio), and leverage \
         (Debt_to_Equity, Debt_to_Assets, Asset_Turnover)."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "ratios": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Ratios to calculate (P/E, ROE, Current_Ratio, Debt_to_Equity, ...)"
                }
            },
            "required": ["ticker", "ratios"]
        })
    }
}
