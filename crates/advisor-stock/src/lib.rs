//! Agentic stock-analysis orchestration
//!
//! This crate wires the advisor-rs components into the full analysis
//! service:
//!
//! - A fixed catalogue of seven analysis tools (quarterly data, ratios,
//!   peer comparison, analyst consensus, market context, anomaly
//!   detection, health scoring), each built on the market gateway
//! - The [`Orchestrator`]: a bounded agent loop in which the decision
//!   model picks tools round by round until it produces a final
//!   recommendation
//! - The [`FallbackAnalyzer`]: a deterministic single-pass path used when
//!   the decision model is unavailable or keeps failing
//! - Recommendation extraction over the fixed five-way scale
//!
//! # Example
//!
//! ```rust,ignore
//! use advisor_market::{GatewayConfig, MarketGateway, YahooFinanceSource};
//! use advisor_stock::{AdvisorConfig, AnalysisRequest, Orchestrator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Arc::new(AdvisorConfig::default().with_env_api_key());
//!     let source = Arc::new(YahooFinanceSource::new(
//!         config.gateway.request_timeout,
//!     )?);
//!     let gateway = Arc::new(MarketGateway::new(source, config.gateway.clone()));
//!
//!     let orchestrator = Orchestrator::new(config, gateway);
//!     let result = orchestrator.analyze(AnalysisRequest::new("AAPL")).await?;
//!     println!("{}: {}", result.ticker, result.recommendation);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod prompts;
pub mod recommendation;
pub mod result;
pub mod tools;

// Re-export main types for convenience
pub use config::{AdvisorConfig, AdvisorConfigBuilder, HealthPolicy, TrendThresholds};
pub use error::{AdvisorError, Result};
pub use fallback::{FallbackAnalyzer, GrowthTrend};
pub use orchestrator::Orchestrator;
pub use recommendation::{Recommendation, extract_recommendation};
pub use result::{AnalysisDepth, AnalysisRequest, AnalysisResult};
pub use tools::build_catalog;
