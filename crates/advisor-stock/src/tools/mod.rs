//! The fixed catalogue of analysis tools
//!
//! Seven tools, each composing gateway fetches with pure computation. The
//! catalogue is built once at startup by [`build_catalog`] and never
//! mutated afterwards.

pub mod anomalies;
pub mod consensus;
pub mod health;
pub mod market_context;
pub mod peers;
pub mod quarterly;
pub mod ratios;

pub use anomalies::AnomalyDetectionTool;
pub use consensus::AnalystConsensusTool;
pub use health::FinancialHealthTool;
pub use market_context::MarketContextTool;
pub use peers::PeerComparisonTool;
pub use quarterly::QuarterlyDataTool;
pub use ratios::FinancialRatiosTool;

use advisor_market::MarketGateway;
use advisor_tools::ToolRegistry;
use serde_json::{Value, json};
use std::sync::Arc;

/// Build the fixed tool catalogue over one gateway
pub fn build_catalog(gateway: Arc<MarketGateway>) -> Arc<ToolRegistry> {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(QuarterlyDataTool::new(gateway.clone())));
    registry.register(Arc::new(FinancialRatiosTool::new(gateway.clone())));
    registry.register(Arc::new(PeerComparisonTool::new(gateway.clone())));
    registry.register(Arc::new(AnalystConsensusTool::new(gateway.clone())));
    registry.register(Arc::new(MarketContextTool::new(gateway.clone())));
    registry.register(Arc::new(AnomalyDetectionTool::new(gateway.clone())));
    registry.register(Arc::new(FinancialHealthTool::new(gateway)));
    Arc::new(registry)
}

/// Structured failure payload returned when a tool's upstream data is
/// unavailable; the orchestrator feeds it back to the decision model as
/// informative input rather than aborting the session
pub(crate) fn failure(tool: &str, error: impl std::fmt::Display) -> Value {
    json!({
        "success": false,
        "error": error.to_string(),
        "tool_used": tool,
    })
}

/// Divide, reporting the ratio as absent for missing or zero denominators
/// (never 0, NaN, or infinity)
pub(crate) fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let n = numerator?;
    let d = denominator?;
    if d == 0.0 {
        return None;
    }
    let ratio = n / d;
    ratio.is_finite().then_some(ratio)
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// In-memory gateway fixtures shared by the tool unit tests
#[cfg(test)]
pub(crate) mod testutil {
    use advisor_market::{
        GatewayConfig, MarketDataSource, MarketError, MarketGateway, Operation,
    };
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    /// Source serving canned payloads keyed by (symbol, operation name)
    #[derive(Default)]
    pub struct StaticSource {
        responses: HashMap<(String, &'static str), Value>,
    }

    impl StaticSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(
            mut self,
            symbol: &str,
            operation: Operation,
            payload: impl serde::Serialize,
        ) -> Self {
            let value = serde_json::to_value(payload).expect("fixture serializes");
            self.responses
                .insert((symbol.to_uppercase(), operation.as_str()), value);
            self
        }
    }

    #[async_trait]
    impl MarketDataSource for StaticSource {
        async fn fetch(
            &self,
            symbol: &str,
            operation: Operation,
        ) -> advisor_market::Result<Value> {
            self.responses
                .get(&(symbol.to_uppercase(), operation.as_str()))
                .cloned()
                .ok_or_else(|| MarketError::NotFound(symbol.to_string()))
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    /// Gateway over a static source with test-friendly pacing
    pub fn gateway(source: StaticSource) -> Arc<MarketGateway> {
        let config = GatewayConfig {
            min_request_interval: Duration::from_millis(1),
            jitter_min: Duration::ZERO,
            jitter_interval: Duration::from_millis(1),
            retry_backoff_base: Duration::from_millis(1),
            rate_limit_backoff: (Duration::from_millis(1), Duration::from_millis(2)),
            ..Default::default()
        };
        Arc::new(MarketGateway::new(Arc::new(source), config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_contains_all_seven_tools() {
        let catalog = build_catalog(testutil::gateway(testutil::StaticSource::new()));

        assert_eq!(catalog.len(), 7);
        for name in [
            "fetch_quarterly_data",
            "calculate_financial_ratios",
            "compare_with_peers",
            "get_analyst_consensus",
            "fetch_market_context",
            "detect_financial_anomalies",
            "assess_financial_health",
        ] {
            assert!(catalog.get(name).is_some(), "missing tool {name}");
        }
    }

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(Some(10.0), Some(4.0)), Some(2.5));
        assert_eq!(safe_ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(safe_ratio(None, Some(4.0)), None);
        assert_eq!(safe_ratio(Some(10.0), None), None);
    }

    #[test]
    fn test_failure_payload_shape() {
        let payload = failure("fetch_quarterly_data", "no data");
        assert_eq!(payload["success"], false);
        assert_eq!(payload["error"], "no data");
        assert_eq!(payload["tool_used"], "fetch_quarterly_data");
    }
}
