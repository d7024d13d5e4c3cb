//! Message types for decision-model conversations
//!
//! The conversation model follows the function-calling protocol: the model
//! replies either with text or with function-call parts, and tool outputs
//! flow back as function-response parts. The wire shapes here match
//! Gemini's `contents` format so the provider can serialize them directly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The requesting user
    User,
    /// The decision model
    Model,
    /// A tool result being fed back to the model
    Function,
}

/// A function-call request emitted by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Name of the tool to invoke
    pub name: String,
    /// Arguments as a JSON object
    #[serde(default)]
    pub args: Value,
}

/// A tool result returned to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    /// Name of the tool that produced the result
    pub name: String,
    /// Result payload
    pub response: Value,
}

/// One part of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    /// Plain text content
    Text {
        /// Text content
        text: String,
    },

    /// Tool invocation requested by the model
    FunctionCall {
        /// The requested call
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },

    /// Tool result supplied back to the model
    FunctionResponse {
        /// The supplied result
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Turn role
    pub role: Role,

    /// Message parts
    pub parts: Vec<Part>,
}

impl Message {
    /// Create a user message with text
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// Create a model message with text
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// Create a function-response message carrying a tool result
    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            role: Role::Function,
            parts: vec![Part::FunctionResponse {
                function_response: FunctionResponse {
                    name: name.into(),
                    response,
                },
            }],
        }
    }

    /// Extract the first text part, if any
    pub fn text(&self) -> Option<&str> {
        self.parts.iter().find_map(|p| match p {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Concatenate all text parts
    pub fn all_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Extract all function-call parts
    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::FunctionCall { function_call } => Some(function_call),
                _ => None,
            })
            .collect()
    }

    /// Check whether the model requested any function calls
    pub fn has_function_calls(&self) -> bool {
        !self.function_calls().is_empty()
    }
}
