//! Tool registry: the dispatcher boundary between the agent loop and tool
//! implementations.
//!
//! `dispatch` always returns text. Unknown names and execution failures
//! become error strings the model can read and recover from; nothing
//! propagates past this boundary.

use std::sync::Arc;

use crate::llm::ToolDefinition;
use crate::tools::tool::Tool;

/// Ordered collection of the tools available to the model.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Catalog order follows registration order.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The fixed tool catalog sent with every model call.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Execute a tool by name with parsed arguments.
    pub async fn dispatch(&self, name: &str, args: serde_json::Value) -> String {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = %name, "Model requested unknown tool");
            return format!("Unknown tool: {}", name);
        };

        match tool.execute(args).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool execution failed");
                format!("Error: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::tool::EchoTool;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let result = registry()
            .dispatch("echo", serde_json::json!({"message": "hi"}))
            .await;
        assert_eq!(result, "hi");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let result = registry().dispatch("nope", serde_json::json!({})).await;
        assert_eq!(result, "Unknown tool: nope");
    }

    #[tokio::test]
    async fn test_dispatch_folds_errors_into_text() {
        let result = registry().dispatch("echo", serde_json::json!({})).await;
        assert!(result.starts_with("Error: Invalid parameters"));
    }

    #[test]
    fn test_definitions_keep_registration_order() {
        let defs = registry().definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }
}
