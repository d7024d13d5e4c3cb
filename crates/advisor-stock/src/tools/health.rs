//! Tool for assessing overall financial health

use advisor_core::Result as CoreResult;
use advisor_market::{MarketGateway, Operation};
use advisor_tools::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::HealthPolicy;
use crate::error::Result;
use crate::tools::{failure, round1, safe_ratio};

/// Per-category 0-100 scores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryScores {
    pub liquidity: f64,
    pub leverage: f64,
    pub profitability: f64,
    pub efficiency: f64,
}

/// Full health assessment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthAssessment {
    /// Equal-weighted mean of the four category scores, 0-100
    pub overall_score: f64,
    pub category_scores: CategoryScores,
    /// The underlying ratios, absent where data was missing
    pub key_indicators: BTreeMap<String, Option<f64>>,
    pub risk_factors: Vec<String>,
    pub strengths: Vec<String>,
}

/// Tool: 0-100 financial health score with a category breakdown
pub struct FinancialHealthTool {
    gateway: Arc<MarketGateway>,
    policy: HealthPolicy,
}

#[derive(Debug, Deserialize)]
struct HealthParams {
    ticker: String,
}

impl FinancialHealthTool {
    /// Create a tool with the default scoring policy
    pub fn new(gateway: Arc<MarketGateway>) -> Self {
        Self::with_policy(gateway, HealthPolicy::default())
    }

    /// Create a tool with a custom scoring policy
    pub fn with_policy(gateway: Arc<MarketGateway>, policy: HealthPolicy) -> Self {
        Self { gateway, policy }
    }

    /// Compute the health assessment for a ticker
    ///
    /// Also used directly by the fallback analyzer.
    pub async fn assess(&self, ticker: &str) -> Result<HealthAssessment> {
        let profile = self.gateway.profile(ticker).await?;
        let balance = self
            .gateway
            .statement(ticker, Operation::BalanceSheet)
            .await
            .unwrap_or_default();
        let income = self
            .gateway
            .statement(ticker, Operation::IncomeStatement)
            .await
            .unwrap_or_default();

        let current_ratio = safe_ratio(balance.current_assets, balance.current_liabilities);
        let quick_assets = balance
            .current_assets
            .map(|assets| assets - balance.inventory.unwrap_or(0.0));
        let quick_ratio = safe_ratio(quick_assets, balance.current_liabilities);
        let debt_to_equity = safe_ratio(balance.total_debt, balance.stockholders_equity);
        let debt_to_assets = safe_ratio(balance.total_debt, balance.total_assets);
        let roe = profile.return_on_equity.map(percentify);
        let roa = profile.return_on_assets.map(percentify);
        let profit_margin = profile.profit_margin.map(percentify);
        let asset_turnover = safe_ratio(
            income.revenue.or(profile.total_revenue),
            balance.total_assets,
        );

        let policy = &self.policy;
        let scores = CategoryScores {
            liquidity: score_liquidity(policy, current_ratio, quick_ratio),
            leverage: score_leverage(policy, debt_to_equity, debt_to_assets),
            profitability: score_profitability(policy, roe, roa, profit_margin),
            efficiency: score_efficiency(policy, asset_turnover),
        };
        let overall = round1(
            (scores.liquidity + scores.leverage + scores.profitability + scores.efficiency) / 4.0,
        );

        let mut risk_factors = Vec::new();
        let mut strengths = Vec::new();
        for (score, risk, strength) in [
            (
                scores.liquidity,
                "Low liquidity - potential cash flow issues",
                "Strong liquidity position",
            ),
            (
                scores.leverage,
                "High debt levels - financial leverage risk",
                "Conservative debt management",
            ),
            (
                scores.profitability,
                "Below-average profitability",
                "Strong profitability metrics",
            ),
        ] {
            if score < policy.risk_cutoff {
                risk_factors.push(risk.to_string());
            } else if score > policy.strength_cutoff {
                strengths.push(strength.to_string());
            }
        }

        let key_indicators = BTreeMap::from([
            ("current_ratio".to_string(), current_ratio),
            ("quick_ratio".to_string(), quick_ratio),
            ("debt_to_equity".to_string(), debt_to_equity),
            ("debt_to_assets".to_string(), debt_to_assets),
            ("roe".to_string(), roe),
            ("roa".to_string(), roa),
            ("profit_margin".to_string(), profit_margin),
            ("asset_turnover".to_string(), asset_turnover),
        ]);

        Ok(HealthAssessment {
            overall_score: overall,
            category_scores: scores,
            key_indicators,
            risk_factors,
            strengths,
        })
    }

    async fn run(&self, params: HealthParams) -> Result<Value> {
        let assessment = self.assess(&params.ticker).await?;

        Ok(json!({
            "success": true,
            "ticker": params.ticker.to_uppercase(),
            "assessment": assessment,
            "tool_used": self.name(),
        }))
    }
}

// Upstream profitability fields arrive as fractions; scores work in percent
fn percentify(value: f64) -> f64 {
    if value.abs() < 1.0 { value * 100.0 } else { value }
}

fn band_points(value: f64, bands: [f64; 3], ascending_good: bool) -> f64 {
    const POINTS: [f64; 4] = [50.0, 35.0, 20.0, 10.0];
    let index = if ascending_good {
        bands.iter().position(|&b| value >= b)
    } else {
        bands.iter().position(|&b| value <= b)
    };
    POINTS[index.unwrap_or(3)]
}

fn score_liquidity(policy: &HealthPolicy, current: Option<f64>, quick: Option<f64>) -> f64 {
    let mut score = 0.0;
    if let Some(current) = current {
        score += band_points(current, policy.current_ratio_bands, true);
    }
    if let Some(quick) = quick {
        score += band_points(quick, policy.quick_ratio_bands, true);
    }
    score.min(100.0)
}

fn score_leverage(
    policy: &HealthPolicy,
    debt_to_equity: Option<f64>,
    debt_to_assets: Option<f64>,
) -> f64 {
    let mut score = 0.0;
    if let Some(d2e) = debt_to_equity {
        score += band_points(d2e, policy.debt_to_equity_bands, false);
    }
    if let Some(d2a) = debt_to_assets {
        score += band_points(d2a, policy.debt_to_assets_bands, false);
    }
    score.min(100.0)
}

fn score_profitability(
    policy: &HealthPolicy,
    roe: Option<f64>,
    roa: Option<f64>,
    margin: Option<f64>,
) -> f64 {
    fn graded(value: f64, bands: [f64; 3], points: [f64; 4]) -> f64 {
        let index = bands.iter().position(|&b| value >= b).unwrap_or(3);
        points[index]
    }

    let mut score = 0.0;
    if let Some(roe) = roe {
        score += graded(roe, policy.roe_bands, [35.0, 25.0, 15.0, 5.0]);
    }
    if let Some(roa) = roa {
        score += graded(roa, policy.roa_bands, [35.0, 25.0, 15.0, 5.0]);
    }
    if let Some(margin) = margin {
        score += graded(margin, policy.margin_bands, [30.0, 20.0, 10.0, 5.0]);
    }
    score.min(100.0)
}

fn score_efficiency(policy: &HealthPolicy, asset_turnover: Option<f64>) -> f64 {
    let Some(turnover) = asset_turnover else {
        // No data: neutral score
        return 50.0;
    };

    let bands = policy.asset_turnover_bands;
    if turnover >= bands[0] {
        100.0
    } else if turnover >= bands[1] {
        80.0
    } else if turnover >= bands[2] {
        60.0
    } else if turnover >= bands[3] {
        40.0
    } else {
        20.0
    }
}

#[async_trait]
impl Tool for FinancialHealthTool {
    async fn execute(&self, args: Value) -> CoreResult<Value> {
        let params: HealthParams = serde_json::from_value(args).map_err(|e| {
            advisor_core::Error::InvalidToolRequest(format!("invalid parameters: {e}"))
        })?;

        match self.run(params).await {
            Ok(value) => Ok(value),
            Err(e) => Ok(failure(self.name(), e)),
        }
    }

    fn name(&self) -> &str {
        "assess_financial_health"
    }

    fn description(&self) -> &str {
        "Calculate a comprehensive 0-100 financial health score from \
         liquidity, leverage, profitability, and efficiency ratios, with \
         named strengths and risk factors."
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
