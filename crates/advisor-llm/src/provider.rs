//! Decision provider trait definition

use crate::{DecisionOutcome, DecisionRequest, Message, Result};
use async_trait::async_trait;

/// Response from one decision round
#[derive(Debug, Clone)]
pub struct DecisionResponse {
    /// The model's raw message, to be appended to the conversation
    pub message: Message,

    /// The derived outcome (final answer or tool requests)
    pub outcome: DecisionOutcome,
}

/// Trait for decision-model providers
///
/// Implementations adapt an external model service that supports
/// structured function calling. Providers perform no caching: every call
/// reflects the conversation state it was given.
#[async_trait]
pub trait DecisionProvider: Send + Sync {
    /// Run one decision round
    ///
    /// # Arguments
    ///
    /// * `request` - Conversation, system instruction, and available tools
    ///
    /// # Returns
    ///
    /// The model's message together with its derived [`DecisionOutcome`]
    async fn decide(&self, request: DecisionRequest) -> Result<DecisionResponse>;

    /// Get the provider name (e.g. "gemini")
    fn name(&self) -> &str;
}
