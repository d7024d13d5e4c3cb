//! Decision request types

use crate::{Message, ToolDefinition};
use serde::{Deserialize, Serialize};

/// Sampling configuration for a decision call
///
/// Defaults are tuned for deterministic function calling: very low
/// temperature and aggressive top-k/top-p truncation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Sampling temperature (0.0-1.0)
    pub temperature: f32,

    /// Top-k truncation
    pub top_k: u32,

    /// Top-p nucleus sampling
    pub top_p: f32,

    /// Maximum tokens to generate
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_k: 1,
            top_p: 0.1,
            max_output_tokens: 2048,
        }
    }
}

/// Request for one decision round with full conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRequest {
    /// Model identifier (provider-specific)
    pub model: String,

    /// Conversation history, oldest turn first
    pub messages: Vec<Message>,

    /// Optional system instruction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Tools available for the model to call
    pub tools: Vec<ToolDefinition>,

    /// Sampling configuration
    pub generation: GenerationConfig,
}

impl DecisionRequest {
    /// Create a builder for decision requests
    pub fn builder(model: impl Into<String>) -> DecisionRequestBuilder {
        DecisionRequestBuilder::new(model)
    }
}

/// Builder for DecisionRequest
pub struct DecisionRequestBuilder {
    model: String,
    messages: Vec<Message>,
    system: Option<String>,
    tools: Vec<ToolDefinition>,
    generation: GenerationConfig,
}

impl DecisionRequestBuilder {
    /// Create a new builder
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            system: None,
            tools: Vec::new(),
            generation: GenerationConfig::default(),
        }
    }

    /// Set the conversation messages
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Add a single message
    pub fn add_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Set the system instruction
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the available tools
    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    /// Set the sampling configuration
    pub fn generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.generation.temperature = temperature;
        self
    }

    /// Set the maximum output tokens
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.generation.max_output_tokens = max_output_tokens;
        self
    }

    /// Build the decision request
    pub fn build(self) -> DecisionRequest {
        DecisionRequest {
            model: self.model,
            messages: self.messages,
            system: self.system,
            tools: self.tools,
            generation: self.generation,
        }
    }
}
