//! The analysis orchestrator: a bounded agent loop
//!
//! Drives the multi-turn conversation with the decision model: every round
//! either yields a final answer (recommendation extracted, session done)
//! or a batch of tool requests (validated, dispatched in order, results
//! appended). The loop is bounded by the configured iteration cap, and any
//! unrecoverable decision-model failure hands the session to the fallback
//! analyzer instead of failing the request.

use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use crate::fallback::FallbackAnalyzer;
use crate::prompts;
use crate::recommendation::extract_recommendation;
use crate::result::{AnalysisRequest, AnalysisResult};
use advisor_core::RetryPolicy;
use advisor_llm::{
    DecisionClient, DecisionOutcome, DecisionProvider, DecisionRequest, GeminiProvider, Message,
    ToolDefinition, ToolInvocation,
};
use advisor_market::MarketGateway;
use advisor_tools::ToolRegistry;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Orchestrates one analysis session per request
pub struct Orchestrator {
    config: Arc<AdvisorConfig>,
    gateway: Arc<MarketGateway>,
    registry: Arc<ToolRegistry>,
    fallback: FallbackAnalyzer,
    provider_override: Option<Arc<dyn DecisionProvider>>,
}

impl Orchestrator {
    /// Create an orchestrator with the fixed tool catalogue over a gateway
    pub fn new(config: Arc<AdvisorConfig>, gateway: Arc<MarketGateway>) -> Self {
        let registry = crate::tools::build_catalog(gateway.clone());
        let fallback = FallbackAnalyzer::new(gateway.clone(), &config);
        Self {
            config,
            gateway,
            registry,
            fallback,
            provider_override: None,
        }
    }

    /// Replace the decision provider (used by tests and embedders)
    pub fn with_provider(mut self, provider: Arc<dyn DecisionProvider>) -> Self {
        self.provider_override = Some(provider);
        self
    }

    /// The gateway backing this orchestrator's tools
    pub fn gateway(&self) -> &Arc<MarketGateway> {
        &self.gateway
    }

    /// Run one analysis session
    ///
    /// Always produces an [`AnalysisResult`] for a well-formed ticker; the
    /// fallback analyzer covers every unrecoverable decision-model path.
    pub async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        let ticker = validate_ticker(&request.ticker)?;
        info!("Starting analysis session for {}", ticker);

        let client = match self.decision_client(&request) {
            Ok(client) => client,
            Err(e) => {
                // ConfigurationMissing path: not a caller-visible crash
                warn!("Decision client unavailable for {}: {}", ticker, e);
                return Ok(self.fallback.analyze(&ticker, e.to_string()).await);
            }
        };

        let tools = self.tool_definitions();
        let system = prompts::analyst_system_prompt();
        let mut conversation = vec![Message::user(prompts::initial_request(&request))];
        let mut tools_used: Vec<String> = Vec::new();

        for round in 1..=self.config.max_iterations {
            debug!(round, ticker = %ticker, "Decision round started");

            let decision_request = DecisionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .system(system.clone())
                .tools(tools.clone())
                .build();

            let response = match client.decide(decision_request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Decision model failed for {} after retries: {}", ticker, e);
                    return Ok(self
                        .fallback
                        .analyze(&ticker, format!("decision model failed: {e}"))
                        .await);
                }
            };

            conversation.push(response.message);

            match response.outcome {
                DecisionOutcome::FinalAnswer(text) => {
                    let recommendation = extract_recommendation(&text);
                    info!(
                        round,
                        %recommendation,
                        "Analysis session finished for {}", ticker
                    );
                    return Ok(AnalysisResult {
                        ticker,
                        narrative: text,
                        recommendation,
                        tools_used,
                        iterations: round,
                        fallback: false,
                        fallback_reason: None,
                        iteration_capped: false,
                        generated_at: Utc::now(),
                    });
                }
                DecisionOutcome::ToolRequests(invocations) => {
                    info!(
                        round,
                        count = invocations.len(),
                        "Dispatching tool requests for {}", ticker
                    );
                    for invocation in invocations {
                        let (name, result) =
                            self.dispatch(&ticker, invocation, &mut tools_used).await;
                        conversation.push(Message::function_response(name, result));
                    }
                }
            }

            if round < self.config.max_iterations {
                tokio::time::sleep(self.config.round_delay).await;
            }
        }

        // Iteration cap reached: synthesize from whatever the model said
        warn!(
            "Iteration cap ({}) reached for {}",
            self.config.max_iterations, ticker
        );
        Ok(self.capped_result(&ticker, &conversation, tools_used))
    }

    /// Validate and execute one tool invocation, in request order
    ///
    /// Returns the tool name and the payload to append as its function
    /// response. Invalid requests and tool failures both come back as
    /// structured error payloads the model can react to.
    async fn dispatch(
        &self,
        ticker: &str,
        invocation: ToolInvocation,
        tools_used: &mut Vec<String>,
    ) -> (String, Value) {
        let ToolInvocation { name, mut args } = invocation;

        // The model sometimes omits the ticker it is analyzing
        if !args.is_object() {
            args = json!({});
        }
        if let Some(map) = args.as_object_mut() {
            map.entry("ticker").or_insert_with(|| json!(ticker));
        }

        if let Err(e) = self.registry.validate_invocation(&name, &args) {
            warn!("Rejected tool invocation '{}': {}", name, e);
            return (
                name.clone(),
                json!({
                    "success": false,
                    "error": e.to_string(),
                    "invalid_request": true,
                }),
            );
        }

        // validate_invocation guarantees the tool exists
        let Some(tool) = self.registry.get(&name) else {
            return (
                name.clone(),
                json!({
                    "success": false,
                    "error": format!("unknown tool '{name}'"),
                    "invalid_request": true,
                }),
            );
        };

        debug!("Executing tool {}", name);
        match tool.execute(args).await {
            Ok(result) => {
                if result.get("success").and_then(Value::as_bool) != Some(false)
                    && !tools_used.contains(&name)
                {
                    tools_used.push(name.clone());
                }
                (name, result)
            }
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                (
                    name.clone(),
                    json!({
                        "success": false,
                        "error": e.to_string(),
                        "tool_used": name,
                    }),
                )
            }
        }
    }

    fn capped_result(
        &self,
        ticker: &str,
        conversation: &[Message],
        tools_used: Vec<String>,
    ) -> AnalysisResult {
        let model_text: String = conversation
            .iter()
            .filter(|m| m.role == advisor_llm::Role::Model)
            .map(Message::all_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        let recommendation = extract_recommendation(&model_text);
        let narrative = if model_text.is_empty() {
            format!(
                "Analysis of {ticker} stopped after {} decision rounds without \
                 a final answer. Defaulting to a neutral stance.\n\n\
                 RECOMMENDATION: {recommendation}",
                self.config.max_iterations
            )
        } else {
            format!(
                "Analysis of {ticker} stopped after {} decision rounds without \
                 a final answer. Partial findings:\n\n{model_text}\n\n\
                 RECOMMENDATION: {recommendation}",
                self.config.max_iterations
            )
        };

        AnalysisResult {
            ticker: ticker.to_string(),
            narrative,
            recommendation,
            tools_used,
            iterations: self.config.max_iterations,
            fallback: false,
            fallback_reason: None,
            iteration_capped: true,
            generated_at: Utc::now(),
        }
    }

    fn decision_client(&self, request: &AnalysisRequest) -> Result<DecisionClient> {
        let retry = RetryPolicy::new(
            self.config.decision_max_retries.max(1),
            self.config.decision_backoff_base,
            Duration::from_secs(60),
            2.0,
        );

        if let Some(provider) = &self.provider_override {
            return Ok(DecisionClient::new(provider.clone(), retry)
                .with_default_rate_limit_delay(self.config.decision_rate_limit_delay));
        }

        let api_key = request
            .api_key
            .clone()
            .or_else(|| self.config.api_key.clone())
            .ok_or_else(|| {
                AdvisorError::Config("no decision-model credential configured".to_string())
            })?;

        let provider = GeminiProvider::new(api_key, self.config.decision_timeout)
            .map_err(AdvisorError::Llm)?;
        Ok(DecisionClient::new(Arc::new(provider), retry)
            .with_default_rate_limit_delay(self.config.decision_rate_limit_delay))
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry
            .list_tools()
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect()
    }
}

fn validate_ticker(ticker: &str) -> Result<String> {
    let trimmed = ticker.trim().to_uppercase();
    let valid = !trimmed.is_empty()
        && trimmed.len() <= 10
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '^');
    if valid {
        Ok(trimmed)
    } else {
        Err(AdvisorError::InvalidSymbol(ticker.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ticker() {
        assert_eq!(validate_ticker("aapl").unwrap(), "AAPL");
        assert_eq!(validate_ticker(" BRK.B ").unwrap(), "BRK.B");
        assert_eq!(validate_ticker("^GSPC").unwrap(), "^GSPC");
        assert!(validate_ticker("").is_err());
        assert!(validate_ticker("NOT A TICKER").is_err());
        assert!(validate_ticker("WAYTOOLONGSYMBOL").is_err());
    }
}
