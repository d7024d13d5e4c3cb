//! Decision outcome types

use crate::messages::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation requested by the decision model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Requested tool name (validated against the registry before dispatch)
    pub name: String,

    /// Argument object as produced by the model
    pub args: Value,
}

/// Outcome of one decision round
///
/// Every round ends in exactly one of these branches, so callers handle
/// both exhaustively instead of probing a dynamic response shape.
#[derive(Debug, Clone)]
pub enum DecisionOutcome {
    /// The model produced its final analysis text
    FinalAnswer(String),

    /// The model requested one or more tool invocations, in order
    ToolRequests(Vec<ToolInvocation>),
}

impl DecisionOutcome {
    /// Derive the outcome from a model message
    ///
    /// Any function-call part makes the round a tool-request round; the
    /// requested order is preserved. Otherwise the concatenated text is
    /// the final answer.
    pub fn from_message(message: &Message) -> Self {
        let calls = message.function_calls();
        if calls.is_empty() {
            Self::FinalAnswer(message.all_text())
        } else {
            Self::ToolRequests(
                calls
                    .into_iter()
                    .map(|c| ToolInvocation {
                        name: c.name.clone(),
                        args: c.args.clone(),
                    })
                    .collect(),
            )
        }
    }

    /// Whether this outcome is a final answer
    pub fn is_final(&self) -> bool {
        matches!(self, Self::FinalAnswer(_))
    }
}
