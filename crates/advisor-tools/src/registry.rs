//! Tool registry mapping names to handlers and schemas

use crate::{Tool, validate_args};
use advisor_core::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Registry for analysis tools
///
/// Built once at startup from the fixed tool catalogue and treated as
/// immutable afterwards. The name → (schema, handler) mapping lives in one
/// place so schema and handler can never drift apart.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.tools.write().unwrap();
        tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap();
        tools.get(name).cloned()
    }

    /// List all registered tools
    ///
    /// Used to build the tool definitions advertised to the decision model.
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        let tools = self.tools.read().unwrap();
        tools.values().cloned().collect()
    }

    /// Validate an invocation against the named tool's schema
    ///
    /// Fails with [`Error::InvalidToolRequest`] when the tool is unknown or
    /// the arguments do not satisfy its schema. Must be called before every
    /// dispatch of a model-produced invocation.
    pub fn validate_invocation(&self, name: &str, args: &Value) -> Result<()> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::InvalidToolRequest(format!("unknown tool '{name}'")))?;
        validate_args(&tool.input_schema(), args)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        let tools = self.tools.read().unwrap();
        tools.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        let tools = self.tools.read().unwrap();
        tools.is_empty()
    }
}
