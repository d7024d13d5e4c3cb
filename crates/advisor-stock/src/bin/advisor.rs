//! CLI for the stock advisor
//!
//! `advisor analyze AAPL` runs one analysis session; `advisor cache-stats`
//! and `advisor cache-clear` are the thin operational surface over the
//! gateway cache.

use advisor_market::{MarketGateway, YahooFinanceSource};
use advisor_stock::{AdvisorConfig, AnalysisDepth, AnalysisRequest, Orchestrator};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "advisor", about = "Agentic stock analysis", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a ticker and print the result as JSON
    Analyze {
        /// Ticker symbol (e.g. AAPL)
        ticker: String,

        /// Analysis depth
        #[arg(long, value_enum, default_value_t = DepthArg::Comprehensive)]
        depth: DepthArg,

        /// Areas to emphasize (repeatable)
        #[arg(long = "focus")]
        focus_areas: Vec<String>,

        /// Decision-model API key (falls back to GEMINI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Print cache occupancy and per-entry expiry
    CacheStats,

    /// Clear the gateway cache
    CacheClear,
}

#[derive(Clone, Copy, ValueEnum)]
enum DepthArg {
    Comprehensive,
    Quick,
    Specific,
}

impl From<DepthArg> for AnalysisDepth {
    fn from(depth: DepthArg) -> Self {
        match depth {
            DepthArg::Comprehensive => Self::Comprehensive,
            DepthArg::Quick => Self::Quick,
            DepthArg::Specific => Self::Specific,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    advisor_utils::init_tracing();

    let cli = Cli::parse();
    let config = Arc::new(AdvisorConfig::default().with_env_api_key());
    let source = Arc::new(
        YahooFinanceSource::new(config.gateway.request_timeout)
            .context("failed to build market-data client")?,
    );
    let gateway = Arc::new(MarketGateway::new(source, config.gateway.clone()));

    match cli.command {
        Command::Analyze {
            ticker,
            depth,
            focus_areas,
            api_key,
        } => {
            let mut request = AnalysisRequest::new(ticker)
                .with_depth(depth.into())
                .with_focus_areas(focus_areas);
            if let Some(key) = api_key {
                request = request.with_api_key(key);
            }

            let orchestrator = Orchestrator::new(config, gateway);
            let result = orchestrator
                .analyze(request)
                .await
                .context("analysis failed")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::CacheStats => {
            let stats = gateway.cache_stats().await;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::CacheClear => {
            let removed = gateway.clear_cache().await;
            println!("{removed} cache entries removed");
        }
    }

    Ok(())
}
