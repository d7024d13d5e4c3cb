//! Google Gemini provider implementation
//!
//! Implements the DecisionProvider trait against Gemini's `generateContent`
//! endpoint with function declarations.
//! See: https://ai.google.dev/api/generate-content

use crate::{
    DecisionOutcome, DecisionProvider, DecisionRequest, DecisionResponse, GenerationConfig,
    LLMError, Message, Result, ToolDefinition,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Google Gemini provider
///
/// Supports the Gemini models exposing function calling, e.g.
/// - gemini-2.0-flash
/// - gemini-1.5-pro
pub struct GeminiProvider {
    client: Client,
    api_key: String,
}

impl GeminiProvider {
    /// Create a new Gemini provider with a bounded per-request timeout
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(LLMError::Configuration(
                "Gemini API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, api_key })
    }

    /// Create a provider from the `GEMINI_API_KEY` environment variable
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            LLMError::Configuration("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key, Duration::from_secs(15))
    }
}

#[async_trait]
impl DecisionProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn decide(&self, request: DecisionRequest) -> Result<DecisionResponse> {
        debug!("Sending request to Gemini API");

        let url = format!("{GEMINI_API_BASE}/{}:generateContent", request.model);
        let gemini_request = GeminiRequest::from(&request);

        let response = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimited {
                    retry_after: parse_retry_delay(&error_text),
                    message: error_text,
                },
                400 => LLMError::InvalidRequest(error_text),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        let candidate = gemini_response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No candidates in response".to_string()))?;

        let message = candidate.content;
        let outcome = DecisionOutcome::from_message(&message);

        debug!(
            function_calls = message.function_calls().len(),
            "Received Gemini response"
        );

        Ok(DecisionResponse { message, outcome })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// Extract the service-suggested retry delay from a 429 error body
///
/// Gemini quota errors carry a `google.rpc.RetryInfo` detail with a
/// `retryDelay` like `"21s"` or `"3.5s"`.
fn parse_retry_delay(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let details = value.get("error")?.get("details")?.as_array()?;

    details.iter().find_map(|detail| {
        let kind = detail.get("@type")?.as_str()?;
        if !kind.ends_with("RetryInfo") {
            return None;
        }
        let delay = detail.get("retryDelay")?.as_str()?;
        parse_duration_literal(delay)
    })
}

fn parse_duration_literal(text: &str) -> Option<Duration> {
    let seconds: f64 = text.strip_suffix('s')?.parse().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some(Duration::from_secs_f64(seconds))
    } else {
        None
    }
}

// Gemini-specific request/response types
// These match the generateContent wire format exactly

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTools>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTools {
    function_declarations: Vec<ToolDefinition>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl From<GenerationConfig> for GeminiGenerationConfig {
    fn from(config: GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

impl From<&DecisionRequest> for GeminiRequest {
    fn from(request: &DecisionRequest) -> Self {
        let tools = if request.tools.is_empty() {
            Vec::new()
        } else {
            vec![GeminiTools {
                function_declarations: request.tools.clone(),
            }]
        };

        Self {
            contents: request.messages.clone(),
            system_instruction: request.system.as_ref().map(|text| SystemInstruction {
                parts: vec![TextPart { text: text.clone() }],
            }),
            tools,
            generation_config: request.generation.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Message,
}
