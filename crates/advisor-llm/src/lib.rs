//! Decision-model abstraction layer for advisor-rs
//!
//! This crate adapts an external decision-making model that supports
//! structured function calling. Given a conversation and the schemas of the
//! available analysis tools, the model either answers in free text or
//! requests one or more named tool invocations; both branches are carried
//! in the tagged [`DecisionOutcome`] so callers handle them exhaustively.
//!
//! The shipped provider targets Google's Gemini `generateContent` API
//! (behind the `gemini` feature). [`DecisionClient`] wraps any provider
//! with the shared retry/backoff discipline, honoring machine-suggested
//! rate-limit waits when the service returns them.

pub mod client;
pub mod error;
pub mod messages;
pub mod outcome;
pub mod provider;
pub mod providers;
pub mod request;
pub mod tools;

pub use client::DecisionClient;
pub use error::{LLMError, Result};
pub use messages::{FunctionCall, FunctionResponse, Message, Part, Role};
pub use outcome::{DecisionOutcome, ToolInvocation};
pub use provider::{DecisionProvider, DecisionResponse};
pub use request::{DecisionRequest, DecisionRequestBuilder, GenerationConfig};
pub use tools::ToolDefinition;

#[cfg(feature = "gemini")]
pub use providers::gemini::GeminiProvider;
