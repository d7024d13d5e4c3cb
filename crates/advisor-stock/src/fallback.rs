//! Deterministic fallback analyzer
//!
//! Runs when the agentic path cannot: no decision-model credential, or the
//! decision client failed past its retries. One pass over quarterly data
//! and the health assessment, thresholded trend labels, and a small
//! decision table produce a conservative but always-usable result. This is
//! the terminal safety net - it never fails outright.

use crate::config::{AdvisorConfig, TrendThresholds};
use crate::recommendation::Recommendation;
use crate::result::AnalysisResult;
use crate::tools::health::HealthAssessment;
use crate::tools::{FinancialHealthTool, QuarterlyDataTool};
use advisor_market::{MarketGateway, QuarterlySeries};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

const FALLBACK_QUARTERS: usize = 8;

/// Trend label for quarter-over-quarter revenue movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthTrend {
    Accelerating,
    Growing,
    Stable,
    Slowing,
    Declining,
}

impl GrowthTrend {
    /// Classify a QoQ revenue delta (percent) against the thresholds
    pub fn from_qoq(delta: f64, thresholds: &TrendThresholds) -> Self {
        if delta > thresholds.accelerating {
            Self::Accelerating
        } else if delta > thresholds.growing {
            Self::Growing
        } else if delta >= thresholds.slowing {
            Self::Stable
        } else if delta >= thresholds.declining {
            Self::Slowing
        } else {
            Self::Declining
        }
    }
}

impl fmt::Display for GrowthTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Accelerating => "accelerating",
            Self::Growing => "growing",
            Self::Stable => "stable",
            Self::Slowing => "slowing",
            Self::Declining => "declining",
        };
        f.write_str(label)
    }
}

/// Deterministic single-pass analyzer
pub struct FallbackAnalyzer {
    quarterly: QuarterlyDataTool,
    health: FinancialHealthTool,
    thresholds: TrendThresholds,
}

impl FallbackAnalyzer {
    /// Create an analyzer over the shared gateway
    pub fn new(gateway: Arc<MarketGateway>, config: &AdvisorConfig) -> Self {
        Self {
            quarterly: QuarterlyDataTool::new(gateway.clone()),
            health: FinancialHealthTool::with_policy(gateway, config.health.clone()),
            thresholds: config.trends.clone(),
        }
    }

    /// Produce an analysis without the decision model
    ///
    /// Always returns a usable result; when even the data fetches fail the
    /// narrative says so explicitly and the recommendation stays HOLD.
    pub async fn analyze(&self, ticker: &str, reason: impl Into<String>) -> AnalysisResult {
        let ticker = ticker.to_uppercase();
        let reason = reason.into();
        info!("Running fallback analysis for {}: {}", ticker, reason);

        let series = self.quarterly.fetch_series(&ticker, FALLBACK_QUARTERS).await;
        let assessment = self.health.assess(&ticker).await;

        let (narrative, recommendation, tools_used) = match (series, assessment) {
            (Ok(series), Ok(assessment)) => {
                let trend = revenue_trend(&series, &self.thresholds);
                let narrative = build_narrative(&ticker, &series, &assessment, trend, &self.thresholds);
                let recommendation = decide(assessment.overall_score, trend);
                (
                    narrative,
                    recommendation,
                    vec![
                        "fetch_quarterly_data".to_string(),
                        "assess_financial_health".to_string(),
                    ],
                )
            }
            (Ok(series), Err(e)) => {
                warn!("Fallback health assessment failed for {}: {}", ticker, e);
                let trend = revenue_trend(&series, &self.thresholds);
                let narrative = format!(
                    "Conservative analysis of {ticker} from quarterly data only \
                     (health assessment unavailable). Revenue trend is {}.\n\n\
                     Without a health assessment no directional call is \
                     justified.\n\nRECOMMENDATION: HOLD",
                    trend.map_or("unknown".to_string(), |t| t.to_string()),
                );
                (
                    narrative,
                    Recommendation::Hold,
                    vec!["fetch_quarterly_data".to_string()],
                )
            }
            (Err(e), Ok(assessment)) => {
                warn!("Fallback quarterly fetch failed for {}: {}", ticker, e);
                let narrative = format!(
                    "Conservative analysis of {ticker} from the health \
                     assessment only (quarterly data unavailable). Overall \
                     financial health score: {:.1}/100.\n\nWithout trend data \
                     no directional call is justified.\n\nRECOMMENDATION: HOLD",
                    assessment.overall_score,
                );
                (
                    narrative,
                    Recommendation::Hold,
                    vec!["assess_financial_health".to_string()],
                )
            }
            (Err(se), Err(he)) => {
                warn!(
                    "Fallback data fetches failed for {}: {} / {}",
                    ticker, se, he
                );
                let narrative = format!(
                    "Insufficient data to analyze {ticker}: upstream market \
                     data was unavailable ({se}). No position change is \
                     advised on missing data.\n\nRECOMMENDATION: HOLD"
                );
                (narrative, Recommendation::Hold, Vec::new())
            }
        };

        AnalysisResult {
            ticker,
            narrative,
            recommendation,
            tools_used,
            iterations: 0,
            fallback: true,
            fallback_reason: Some(reason),
            iteration_capped: false,
            generated_at: Utc::now(),
        }
    }
}

fn revenue_trend(series: &QuarterlySeries, thresholds: &TrendThresholds) -> Option<GrowthTrend> {
    let delta = series
        .quarters
        .first()?
        .growth_qoq
        .get("revenue")
        .copied()?;
    Some(GrowthTrend::from_qoq(delta, thresholds))
}

fn fcf_trend(series: &QuarterlySeries, thresholds: &TrendThresholds) -> &'static str {
    let Some(delta) = series
        .quarters
        .first()
        .and_then(|q| q.growth_qoq.get("free_cash_flow").copied())
    else {
        return "unknown";
    };

    if delta > thresholds.fcf_improving {
        "improving"
    } else if delta < thresholds.fcf_declining {
        "declining"
    } else {
        "stable"
    }
}

fn debt_trend(series: &QuarterlySeries) -> &'static str {
    let (Some(latest), Some(previous)) = (
        series.quarters.first().and_then(|q| q.total_debt),
        series.quarters.get(1).and_then(|q| q.total_debt),
    ) else {
        return "unknown";
    };

    if previous == 0.0 {
        return "unknown";
    }
    let change = (latest - previous) / previous.abs() * 100.0;
    if change > 5.0 {
        "rising"
    } else if change < -5.0 {
        "falling"
    } else {
        "stable"
    }
}

/// The fallback decision table over (health score band, growth trend)
///
/// Deliberately conservative: the deterministic path never issues a
/// STRONG call.
fn decide(health_score: f64, trend: Option<GrowthTrend>) -> Recommendation {
    use GrowthTrend::{Accelerating, Declining, Growing, Slowing};

    let Some(trend) = trend else {
        return Recommendation::Hold;
    };

    if health_score >= 75.0 {
        match trend {
            Accelerating | Growing => Recommendation::Buy,
            _ => Recommendation::Hold,
        }
    } else if health_score >= 45.0 {
        match trend {
            Accelerating => Recommendation::Buy,
            Declining => Recommendation::Sell,
            _ => Recommendation::Hold,
        }
    } else {
        match trend {
            Declining | Slowing => Recommendation::Sell,
            _ => Recommendation::Hold,
        }
    }
}

fn build_narrative(
    ticker: &str,
    series: &QuarterlySeries,
    assessment: &HealthAssessment,
    trend: Option<GrowthTrend>,
    thresholds: &TrendThresholds,
) -> String {
    let trend_label = trend.map_or("unknown".to_string(), |t| t.to_string());
    let margin = series.quarters.first().and_then(|q| {
        let revenue = q.revenue?;
        if revenue == 0.0 {
            return None;
        }
        Some(q.net_income? / revenue * 100.0)
    });
    let margin_line = margin.map_or("net margin unavailable".to_string(), |m| {
        format!("latest net margin {m:.1}%")
    });

    let mut narrative = format!(
        "Deterministic analysis of {ticker} (decision model unavailable).\n\n\
         Revenue trend: {trend_label} quarter-over-quarter; {margin_line}. \
         Free cash flow is {fcf}; total debt is {debt}.\n\n\
         Financial health score: {score:.1}/100 \
         (liquidity {liq:.0}, leverage {lev:.0}, profitability {prof:.0}, \
         efficiency {eff:.0}).",
        fcf = fcf_trend(series, thresholds),
        debt = debt_trend(series),
        score = assessment.overall_score,
        liq = assessment.category_scores.liquidity,
        lev = assessment.category_scores.leverage,
        prof = assessment.category_scores.profitability,
        eff = assessment.category_scores.efficiency,
    );

    if !assessment.strengths.is_empty() {
        narrative.push_str("\n\nStrengths: ");
        narrative.push_str(&assessment.strengths.join("; "));
        narrative.push('.');
    }
    if !assessment.risk_factors.is_empty() {
        narrative.push_str("\n\nRisk factors: ");
        narrative.push_str(&assessment.risk_factors.join("; "));
        narrative.push('.');
    }

    let recommendation = decide(assessment.overall_score, trend);
    narrative.push_str(&format!("\n\nRECOMMENDATION: {recommendation}"));
    narrative
}
