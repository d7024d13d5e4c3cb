//! Tool for comparing a company against its peers

use advisor_core::Result as CoreResult;
use advisor_market::{CompanyProfile, MarketGateway};
use advisor_tools::Tool;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::error::Result;
use crate::tools::failure;

const DEFAULT_METRICS: &[&str] = &["market_cap", "pe_ratio", "revenue", "profit_margin"];
const MAX_PEERS: usize = 3;

// Fixed same-sector large caps used when the caller supplies no peers
const SECTOR_PEERS: &[(&str, &[&str])] = &[
    ("Technology", &["MSFT", "AAPL", "NVDA"]),
    ("Healthcare", &["JNJ", "UNH", "PFE"]),
    ("Financial Services", &["JPM", "BAC", "V"]),
    ("Consumer Cyclical", &["AMZN", "TSLA", "HD"]),
    ("Consumer Defensive", &["WMT", "PG", "KO"]),
    ("Communication Services", &["GOOGL", "META", "DIS"]),
    ("Industrials", &["CAT", "HON", "UPS"]),
    ("Energy", &["XOM", "CVX", "COP"]),
    ("Utilities", &["NEE", "DUK", "SO"]),
    ("Real Estate", &["PLD", "AMT", "EQIX"]),
    ("Basic Materials", &["LIN", "APD", "SHW"]),
];

/// Tool: side-by-side comparison against competitor tickers
///
/// Peers are caller-supplied; without them, up to three same-sector large
/// caps are chosen from a fixed table keyed by the target's sector.
pub struct PeerComparisonTool {
    gateway: Arc<MarketGateway>,
}

#[derive(Debug, Deserialize)]
struct PeersParams {
    ticker: String,
    #[serde(default)]
    peers: Option<Vec<String>>,
    #[serde(default)]
    metrics: Option<Vec<String>>,
}

impl PeerComparisonTool {
    /// Create a new peer comparison tool
    pub fn new(gateway: Arc<MarketGateway>) -> Self {
        Self { gateway }
    }

    async fn run(&self, params: PeersParams) -> Result<Value> {
        let target = params.ticker.to_uppercase();
        let target_profile = self.gateway.profile(&target).await?;

        let peers = self.resolve_peers(&target, &target_profile, params.peers);
        if peers.is_empty() {
            return Ok(failure(
                self.name(),
                format!("no peers supplied and sector unknown for {target}"),
            ));
        }

        let metrics: Vec<String> = params
            .metrics
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_METRICS.iter().map(|&m| m.to_string()).collect());

        let mut comparison = Map::new();
        comparison.insert(
            target.clone(),
            company_metrics(&target, Some(&target_profile), &metrics),
        );
        for peer in &peers {
            let entry = match self.gateway.profile(peer).await {
                Ok(profile) => company_metrics(peer, Some(&profile), &metrics),
                Err(e) => {
                    tracing::warn!("Peer fetch failed for {}: {}", peer, e);
                    company_metrics(peer, None, &metrics)
                }
            };
            comparison.insert(peer.clone(), entry);
        }

        let rankings = rank_metrics(&comparison, &metrics);

        Ok(json!({
            "success": true,
            "target_ticker": target,
            "peers": peers,
            "comparison_data": comparison,
            "rankings": rankings,
            "tool_used": self.name(),
        }))
    }

    fn resolve_peers(
        &self,
        target: &str,
        profile: &CompanyProfile,
        requested: Option<Vec<String>>,
    ) -> Vec<String> {
        if let Some(peers) = requested.filter(|p| !p.is_empty()) {
            return peers
                .into_iter()
                .map(|p| p.to_uppercase())
                .filter(|p| p != target)
                .collect();
        }

        let Some(sector) = profile.sector.as_deref() else {
            return Vec::new();
        };

        SECTOR_PEERS
            .iter()
            .find(|(name, _)| *name == sector)
            .map(|(_, peers)| {
                peers
                    .iter()
                    .filter(|&&p| p != target)
                    .take(MAX_PEERS)
                    .map(|&p| p.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn company_metrics(ticker: &str, profile: Option<&CompanyProfile>, metrics: &[String]) -> Value {
    let mut entry = Map::new();
    entry.insert("ticker".to_string(), json!(ticker));

    match profile {
        Some(profile) => {
            for metric in metrics {
                entry.insert(metric.clone(), json!(metric_value(profile, metric)));
            }
        }
        None => {
            entry.insert("error".to_string(), json!("data unavailable"));
        }
    }

    Value::Object(entry)
}

fn metric_value(profile: &CompanyProfile, metric: &str) -> Option<f64> {
    match metric {
        "market_cap" => profile.market_cap,
        "pe_ratio" => profile.pe_ratio,
        "pb_ratio" => profile.pb_ratio,
        "revenue" => profile.total_revenue,
        "net_income" => profile.net_income,
        "profit_margin" => profile.profit_margin,
        "dividend_yield" => profile.dividend_yield,
        "beta" => profile.beta,
        "eps" => profile.eps_trailing,
        _ => None,
    }
}

/// Rank each metric across companies, highest value first
fn rank_metrics(comparison: &Map<String, Value>, metrics: &[String]) -> Value {
    let mut rankings = Map::new();

    for metric in metrics {
        let mut values: Vec<(&String, f64)> = comparison
            .iter()
            .filter_map(|(ticker, data)| {
                data.get(metric).and_then(Value::as_f64).map(|v| (ticker, v))
            })
            .collect();
        values.sort_by(|a, b| b.1.total_cmp(&a.1));

        let ranked: Map<String, Value> = values
            .into_iter()
            .enumerate()
            .map(|(rank, (ticker, _))| (ticker.clone(), json!(rank + 1)))
            .collect();
        rankings.insert(metric.clone(), Value::Object(ranked));
    }

    Value::Object(rankings)
}

#[async_trait]
impl Tool for PeerComparisonTool {
    async fn execute(&self, args: Value) -> CoreResult<Value> {
        let params: PeersParams = serde_json::from_value(args).map_err(|e| {
            advisor_core::Error::InvalidToolRequest(format!("invalid parameters: {e}"))
        })?;

        match self.run(params).await {
            Ok(value) => Ok(value),
            Err(e) => Ok(failure(self.name(), e)),
        }
    }

    fn name(&self) -> &str {
        "compare_with_peers"
    }

    fn description(&self) -> &str {
        "Compare company metrics against industry competitors, producing a \
         side-by-side table and per-metric rankings. Peers may be supplied \
         explicitly or chosen from the company's sector."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "ticker": {
                    "type": "string",
                    "description": "Stock ticker symbol"
                },
                "peers": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Competitor ticker symbols (optional; sector defaults used when omitted)"
                },
                "metrics": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Metrics to compare (market_cap, pe_ratio, revenue, profit_margin, ...)"
                }
            },
            "required": ["ticker"]
        })
    }
}
