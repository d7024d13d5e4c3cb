//! Prompts for the analyst decision model

use crate::result::{AnalysisDepth, AnalysisRequest};

/// System instruction describing the analyst persona
///
/// The closing-format requirement matters: the recommendation extractor's
/// first tier looks for the `RECOMMENDATION:` label this prompt mandates.
pub fn analyst_system_prompt() -> String {
    "You are a decisive financial analyst with access to specialized \
     financial analysis tools. Your goal is to produce clear, actionable \
     investment recommendations backed by data you gathered yourself.\n\n\
     Rules:\n\
     - Call tools to gather data before drawing any conclusion.\n\
     - Be decisive; avoid hedged, noncommittal language.\n\
     - Choose exactly one recommendation: STRONG BUY, BUY, HOLD, SELL, or \
     STRONG SELL.\n\
     - Weigh growth prospects, financial health, valuation, and \
     competitive position.\n\
     - End your final analysis with a line of the form \
     'RECOMMENDATION: <YOUR CHOICE>'."
        .to_string()
}

/// Opening user turn for an analysis session
pub fn initial_request(request: &AnalysisRequest) -> String {
    let ticker = request.ticker.to_uppercase();
    let mut prompt = format!(
        "Analyze {ticker} stock thoroughly and provide a decisive investment \
         recommendation.\n\n\
         Start by calling fetch_quarterly_data and assess_financial_health \
         for {ticker}, then call whichever additional tools the data calls \
         for (ratios, peer comparison, market context, anomaly detection, \
         analyst consensus)."
    );

    match request.depth {
        AnalysisDepth::Quick => {
            prompt.push_str(
                "\n\nKeep it brief: one round of data gathering, then conclude.",
            );
        }
        AnalysisDepth::Specific => {
            prompt.push_str("\n\nLimit the analysis to the focus areas listed below.");
        }
        AnalysisDepth::Comprehensive => {}
    }

    if !request.focus_areas.is_empty() {
        prompt.push_str("\n\nFocus areas: ");
        prompt.push_str(&request.focus_areas.join(", "));
    }

    prompt
}
