//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are what let a specialist agent act on the outside world:
//! reserve stock, charge a card, open a support case, and so on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,

    /// Optional structured data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ToolResult {
    /// A successful result carrying a structured value.
    pub fn json(value: serde_json::Value) -> Self {
        Self {
            call_id: String::new(),
            success: true,
            output: value.to_string(),
            data: Some(value),
        }
    }

    /// A result the tool itself reports as unsuccessful (e.g. a declined charge).
    pub fn failure(value: serde_json::Value) -> Self {
        Self {
            success: false,
            ..Self::json(value)
        }
    }
}

/// The core Tool trait.
///
/// Each tool implements this trait and is registered in a [`ToolRegistry`].
/// Faults are returned as `Err(ToolError)`, never raised.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "check_inventory").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// Read-only once built. A task receives a [`ToolRegistry::subset`] of the
/// full registry; lookups are by exact name.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by exact name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Build a registry holding only the named tools. Unknown names are skipped.
    pub fn subset(&self, names: &[&str]) -> Self {
        let tools = names
            .iter()
            .filter_map(|name| self.tools.get(*name).map(|t| (name.to_string(), t.clone())))
            .collect();
        Self { tools }
    }

    /// Get all tool definitions (for sending to the model), sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry").field("tools", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test tool for unit tests.
    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str { "echo" }
        fn description(&self) -> &str { "Echoes back the input" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            let text = arguments["text"].as_str().unwrap_or("").to_string();
            Ok(ToolResult::json(serde_json::json!({ "text": text })))
        }
    }

    struct NoopTool(&'static str);

    #[async_trait]
    impl Tool for NoopTool {
        fn name(&self) -> &str { self.0 }
        fn description(&self) -> &str { "Does nothing" }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": {} })
        }
        async fn execute(&self, _arguments: serde_json::Value) -> std::result::Result<ToolResult, ToolError> {
            Ok(ToolResult::json(serde_json::json!({})))
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("Echo").is_none());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_subset_keeps_only_named_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(NoopTool("refund_payment")));
        registry.register(Arc::new(NoopTool("update_inventory")));

        let subset = registry.subset(&["refund_payment", "missing"]);
        assert_eq!(subset.names(), vec!["refund_payment"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn registry_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }
}
