//! Tool for detecting anomalies in quarterly financials

use advisor_core::Result as CoreResult;
use advisor_market::{MarketGateway, Operation};
use advisor_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::Result;
use crate::tools::{failure, round2};

const DEFAULT_LOOKBACK: usize = 12;
const MIN_SAMPLES: usize = 4;
const HIGH_SEVERITY_Z: f64 = 2.0;

// Line items screened for spikes and drops
const KEY_METRICS: &[&str] = &["revenue", "net_income", "operating_income", "gross_profit"];

/// Tool: z-score screening of quarterly line items for unusual moves
pub struct AnomalyDetectionTool {
    gateway: Arc<MarketGateway>,
}

#[derive(Debug, Deserialize)]
struct AnomalyParams {
    ticker: String,
    #[serde(default)]
    lookback_periods: Option<usize>,
    #[serde(default)]
    sensitivity: Option<String>,
}

impl AnomalyDetectionTool {
    /// Create a new anomaly detection tool
    pub fn new(gateway: Arc<MarketGateway>) -> Self {
        Self { gateway }
    }

    async fn run(&self, params: AnomalyParams) -> Result<Value> {
        let lookback = params.lookback_periods.unwrap_or(DEFAULT_LOOKBACK).clamp(4, 20);
        let sensitivity = params.sensitivity.as_deref().unwrap_or("medium");
        let threshold = sensitivity_threshold(sensitivity);

        let series = self
            .gateway
            .quarterly(&params.ticker, Operation::QuarterlyIncome)
            .await?;

        if series.quarters.is_empty() {
            return Ok(failure(self.name(), "no quarterly data available"));
        }

        let recent = &series.quarters[..series.quarters.len().min(lookback)];

        let mut anomalies = Vec::new();
        for &metric in KEY_METRICS {
            let values: Vec<f64> = recent.iter().filter_map(|q| q.metric(metric)).collect();
            if values.len() < MIN_SAMPLES {
                continue;
            }

            let mean = mean(&values);
            let std = sample_std(&values, mean);
            if std <= 0.0 {
                continue;
            }

            // Newest quarter first: values[0] is the latest reading
            let latest = values[0];
            let z = ((latest - mean) / std).abs();
            if z > threshold {
                anomalies.push(json!({
                    "metric": metric,
                    "type": if latest > mean { "spike" } else { "drop" },
                    "z_score": round2(z),
                    "latest_value": latest,
                    "historical_mean": round2(mean),
                    "severity": if z > HIGH_SEVERITY_Z { "high" } else { "medium" },
                }));
            }
        }

        Ok(json!({
            "success": true,
            "ticker": series.symbol,
            "anomalies_detected": anomalies.len(),
            "anomalies": anomalies,
            "sensitivity_used": sensitivity,
            "tool_used": self.name(),
        }))
    }
}

fn sensitivity_threshold(sensitivity: &str) -> f64 {
    match sensitivity {
        "low" => 2.0,
        "high" => 1.0,
        _ => 1.5,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

#[async_trait]
impl Tool for AnomalyDetectionTool {
    async fn execute(&self, args: Value) -> CoreResult<Value> {
        let params: AnomalyParams = serde_json::from_value(args).map_err(|e| {
            advisor_core::Error::InvalidToolRequest(format!("invalid parameters: {e}"))
        })?;

        match self.run(params).await {
            Ok(value) => Ok(value),
            Err(e) => Ok(failure(self.name(), e)),
        }
    }

    fn name(&self) -> &str {
        "detect_financial_anomalies"
    }

    fn description(&self) -> &str {
        "Identify unusual patterns or red flags in quarterly financials: \
         spikes and drops in revenue, income, and profit line items scored \
         against their historical distribution."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "lookback_periods": {
                    "type": "integer",
                    "description": "Quarters of history to screen",
                    "minimum": 4,
                    "maximum": 20
                },
                "sensitivity": {
                    "type": "string",
                    "enum": ["low", "medium", "high"],
                    "description": "Detection sensitivity (z-score threshold 2.0/1.5/1.0)"
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
    use advisor_market::{QuarterPoint, QuarterlySeries};

    fn income_series(revenues: &[f64]) -> QuarterlySeries {
        QuarterlySeries {
            symbol: "AAPL".to_string(),
            quarters: revenues
                .iter()
                .map(|&revenue| QuarterPoint {
                    period: "2025-06-30".to_string(),
                    revenue: Some(revenue),
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn tool(revenues: &[f64]) -> AnomalyDetectionTool {
        let source =
            StaticSource::new().with("AAPL", Operation::QuarterlyIncome, income_series(revenues));
        AnomalyDetectionTool::new(gateway(source))
    }

    #[tokio::test]
    async fn test_spike_detected() {
        // Latest quarter is far above the stable history
        let tool = tool(&[200.0, 100.0, 101.0, 99.0, 100.0, 100.0]);

        let result = tool
            .execute(json!({"ticker": "AAPL", "sensitivity": "medium"}))
            .await
            .unwrap();

        assert_eq!(result["success"], true);
        assert_eq!(result["anomalies_detected"], 1);
        assert_eq!(result["anomalies"][0]["metric"], "revenue");
        assert_eq!(result["anomalies"][0]["type"], "spike");
    }

    #[tokio::test]
    async fn test_stable_history_has_no_anomalies() {
        let tool = tool(&[101.0, 100.0, 99.0, 100.0, 101.0, 100.0]);

        let result = tool.execute(json!({"ticker": "AAPL"})).await.unwrap();

        assert_eq!(result["anomalies_detected"], 0);
    }

    #[tokio::test]
    async fn test_too_few_samples_skipped() {
        let tool = tool(&[500.0, 100.0, 100.0]);

        let result = tool.execute(json!({"ticker": "AAPL"})).await.unwrap();
        assert_eq!(result["anomalies_detected"], 0);
    }

    #[tokio::test]
    async fn test_empty_series_is_structured_failure() {
        let tool = tool(&[]);

        let result = tool.execute(json!({"ticker": "AAPL"})).await.unwrap();
        assert_eq!(result["success"], false);
    }

    #[test]
    fn test_sensitivity_thresholds() {
        assert_eq!(sensitivity_threshold("low"), 2.0);
        assert_eq!(sensitivity_threshold("medium"), 1.5);
        assert_eq!(sensitivity_threshold("high"), 1.0);
        assert_eq!(sensitivity_threshold("unknown"), 1.5);
    }

    #[test]
    fn test_sample_std() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert_eq!(m, 5.0);
        let std = sample_std(&values, m);
        assert!((std - 2.138).abs() < 0.01);
    }
}
