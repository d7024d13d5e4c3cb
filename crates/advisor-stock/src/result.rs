//! Analysis request and result types

use crate::recommendation::Recommendation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Requested analysis depth
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    /// Full tool-assisted analysis
    #[default]
    Comprehensive,
    /// Fewer tool rounds, headline conclusions
    Quick,
    /// Focused on the caller-supplied focus areas
    Specific,
}

/// An inbound analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Ticker symbol to analyze
    pub ticker: String,

    /// Requested depth
    #[serde(default)]
    pub depth: AnalysisDepth,

    /// Specific areas to emphasize (e.g. "valuation", "cash flow")
    #[serde(default)]
    pub focus_areas: Vec<String>,

    /// Decision-model credential; overrides the configured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl AnalysisRequest {
    /// Create a request with default depth and no focus areas
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            depth: AnalysisDepth::default(),
            focus_areas: Vec::new(),
            api_key: None,
        }
    }

    /// Set the analysis depth
    pub fn with_depth(mut self, depth: AnalysisDepth) -> Self {
        self.depth = depth;
        self
    }

    /// Set the focus areas
    pub fn with_focus_areas(mut self, areas: Vec<String>) -> Self {
        self.focus_areas = areas;
        self
    }

    /// Set the per-request decision-model credential
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// The terminal artifact of one analysis session
///
/// Created once per request and immutable afterwards. The caller always
/// receives one of these; in the worst case it is a low-confidence
/// fallback result with an explanatory narrative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Upper-cased ticker the analysis is about
    pub ticker: String,

    /// Narrative analysis text
    pub narrative: String,

    /// Extracted recommendation category
    pub recommendation: Recommendation,

    /// Names of the tools that produced data for this analysis
    pub tools_used: Vec<String>,

    /// Number of decision rounds consumed
    pub iterations: usize,

    /// Whether the fallback analyzer produced this result
    pub fallback: bool,

    /// Why the fallback ran, when it did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    /// Whether the session hit the iteration cap without a final answer
    pub iteration_capped: bool,

    /// When the result was produced
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = AnalysisRequest::new("aapl")
            .with_depth(AnalysisDepth::Quick)
            .with_focus_areas(vec!["valuation".to_string()])
            .with_api_key("key");

        assert_eq!(request.ticker, "aapl");
        assert_eq!(request.depth, AnalysisDepth::Quick);
        assert_eq!(request.focus_areas.len(), 1);
        assert!(request.api_key.is_some());
    }

    #[test]
    fn test_result_serialization() {
        let result = AnalysisResult {
            ticker: "AAPL".to_string(),
            narrative: "Strong fundamentals.".to_string(),
            recommendation: Recommendation::Buy,
            tools_used: vec!["fetch_quarterly_data".to_string()],
            iterations: 3,
            fallback: false,
            fallback_reason: None,
            iteration_capped: false,
            generated_at: Utc::now(),
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ticker"], "AAPL");
        assert_eq!(json["recommendation"], "BUY");
        assert!(json.get("fallback_reason").is_none());
    }
}
