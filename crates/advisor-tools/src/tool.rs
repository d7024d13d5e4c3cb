//! Tool trait definition

use advisor_core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for analysis tools the decision model can invoke
///
/// Each tool is a named function over market data: it composes gateway
/// fetches with pure computation and returns a JSON payload. Tools must be
/// idempotent and side-effect-free beyond gateway caching, so repeating an
/// invocation with the same arguments is always safe.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given arguments
    ///
    /// # Arguments
    ///
    /// * `args` - Tool input as a JSON object (validated against
    ///   `input_schema` before dispatch)
    ///
    /// # Returns
    ///
    /// Tool output as a JSON value. Missing upstream data should be
    /// reported as a structured `{"success": false, ...}` payload rather
    /// than an error, so the decision model can react to it.
    async fn execute(&self, args: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    ///
    /// This description is what the decision model uses to choose the tool
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    ///
    /// Describes the parameters this tool expects, with `required` markers.
    /// Invocations are checked against it before dispatch.
    fn input_schema(&self) -> Value;
}
