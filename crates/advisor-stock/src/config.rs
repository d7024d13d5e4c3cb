//! Configuration for analysis operations

use crate::error::{AdvisorError, Result};
use advisor_market::GatewayConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the analysis orchestrator and its collaborators
#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    /// Decision model identifier
    pub model: String,

    /// Credential for the decision-model service; per-request keys take
    /// precedence, and with neither present the fallback analyzer runs
    pub api_key: Option<String>,

    /// Maximum number of decision rounds per session
    pub max_iterations: usize,

    /// Delay between decision rounds
    pub round_delay: Duration,

    /// Timeout for each decision-model call
    pub decision_timeout: Duration,

    /// Maximum number of attempts per decision-model call
    pub decision_max_retries: u32,

    /// Base delay for decision-model retries
    pub decision_backoff_base: Duration,

    /// Default wait for rate limits without a service-suggested delay
    pub decision_rate_limit_delay: Duration,

    /// Gateway configuration (cache, rate limiting, upstream retries)
    pub gateway: GatewayConfig,

    /// Thresholds for the financial health score
    pub health: HealthPolicy,

    /// Thresholds for trend labeling in the fallback analyzer
    pub trends: TrendThresholds,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_key: None,
            max_iterations: 5,
            round_delay: Duration::from_millis(500),
            decision_timeout: Duration::from_secs(15),
            decision_max_retries: 3,
            decision_backoff_base: Duration::from_secs(1),
            decision_rate_limit_delay: Duration::from_secs(2),
            gateway: GatewayConfig::default(),
            health: HealthPolicy::default(),
            trends: TrendThresholds::default(),
        }
    }
}

impl AdvisorConfig {
    /// Create a new configuration builder
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Load the decision-model credential from `GEMINI_API_KEY`
    pub fn with_env_api_key(mut self) -> Self {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.api_key = Some(key);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AdvisorError::Config(
                "max_iterations must be greater than 0".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(AdvisorError::Config(
                "model must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for AdvisorConfig
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    model: Option<String>,
    api_key: Option<String>,
    max_iterations: Option<usize>,
    round_delay: Option<Duration>,
    decision_timeout: Option<Duration>,
    decision_max_retries: Option<u32>,
    gateway: Option<GatewayConfig>,
    health: Option<HealthPolicy>,
    trends: Option<TrendThresholds>,
}

impl AdvisorConfigBuilder {
    /// Set the decision model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the decision-model credential
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the maximum number of decision rounds
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Set the delay between decision rounds
    pub fn round_delay(mut self, delay: Duration) -> Self {
        self.round_delay = Some(delay);
        self
    }

    /// Set the decision-model call timeout
    pub fn decision_timeout(mut self, timeout: Duration) -> Self {
        self.decision_timeout = Some(timeout);
        self
    }

    /// Set the maximum attempts per decision-model call
    pub fn decision_max_retries(mut self, retries: u32) -> Self {
        self.decision_max_retries = Some(retries);
        self
    }

    /// Set the gateway configuration
    pub fn gateway(mut self, gateway: GatewayConfig) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set the health scoring thresholds
    pub fn health(mut self, health: HealthPolicy) -> Self {
        self.health = Some(health);
        self
    }

    /// Set the trend labeling thresholds
    pub fn trends(mut self, trends: TrendThresholds) -> Self {
        self.trends = Some(trends);
        self
    }

    /// Load the decision-model credential from the environment
    pub fn with_env_api_key(mut self) -> Self {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.api_key = Some(key);
        }
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AdvisorConfig> {
        let defaults = AdvisorConfig::default();

        let config = AdvisorConfig {
            model: self.model.unwrap_or(defaults.model),
            api_key: self.api_key,
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            round_delay: self.round_delay.unwrap_or(defaults.round_delay),
            decision_timeout: self.decision_timeout.unwrap_or(defaults.decision_timeout),
            decision_max_retries: self
                .decision_max_retries
                .unwrap_or(defaults.decision_max_retries),
            decision_backoff_base: defaults.decision_backoff_base,
            decision_rate_limit_delay: defaults.decision_rate_limit_delay,
            gateway: self.gateway.unwrap_or(defaults.gateway),
            health: self.health.unwrap_or(defaults.health),
            trends: self.trends.unwrap_or(defaults.trends),
        };

        config.validate()?;
        Ok(config)
    }
}

/// Thresholds for the 0-100 financial health score
///
/// Each ratio is graded against three descending (or ascending, for
/// leverage) cut points into 50/35/20/10 partial scores; the four
/// category scores average into the overall score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthPolicy {
    /// Current ratio cut points, best first
    pub current_ratio_bands: [f64; 3],
    /// Quick ratio cut points, best first
    pub quick_ratio_bands: [f64; 3],
    /// Debt-to-equity cut points, best (lowest) first
    pub debt_to_equity_bands: [f64; 3],
    /// Debt-to-assets cut points, best (lowest) first
    pub debt_to_assets_bands: [f64; 3],
    /// Return-on-equity cut points in percent, best first
    pub roe_bands: [f64; 3],
    /// Return-on-assets cut points in percent, best first
    pub roa_bands: [f64; 3],
    /// Net margin cut points in percent, best first
    pub margin_bands: [f64; 3],
    /// Asset turnover cut points, best first
    pub asset_turnover_bands: [f64; 4],
    /// Category score above which a strength is reported
    pub strength_cutoff: f64,
    /// Category score below which a risk factor is reported
    pub risk_cutoff: f64,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            current_ratio_bands: [2.0, 1.5, 1.0],
            quick_ratio_bands: [1.5, 1.0, 0.8],
            debt_to_equity_bands: [0.3, 0.6, 1.0],
            debt_to_assets_bands: [0.2, 0.4, 0.6],
            roe_bands: [20.0, 15.0, 10.0],
            roa_bands: [15.0, 10.0, 5.0],
            margin_bands: [20.0, 10.0, 5.0],
            asset_turnover_bands: [2.0, 1.5, 1.0, 0.5],
            strength_cutoff: 80.0,
            risk_cutoff: 60.0,
        }
    }
}

/// Thresholds (percent) for labeling quarter-over-quarter trends
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendThresholds {
    /// Revenue QoQ growth above this is "accelerating"
    pub accelerating: f64,
    /// Revenue QoQ growth above this (but below accelerating) is "growing"
    pub growing: f64,
    /// Revenue QoQ growth below this (but above declining) is "slowing"
    pub slowing: f64,
    /// Revenue QoQ growth below this is "declining"
    pub declining: f64,
    /// Free-cash-flow QoQ growth above this is "improving"
    pub fcf_improving: f64,
    /// Free-cash-flow QoQ growth below this is "declining"
    pub fcf_declining: f64,
}

impl Default for TrendThresholds {
    fn default() -> Self {
        Self {
            accelerating: 5.0,
            growing: 1.0,
            slowing: -1.0,
            declining: -5.0,
            fcf_improving: 10.0,
            fcf_declining: -10.0,
        }
    }
}
