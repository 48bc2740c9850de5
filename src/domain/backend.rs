//! Backend Session Abstractions
//!
//! A backend is a live connection to one tool-provider process. The
//! gateway only needs to list its tools, call them, and shut it down.

use crate::error::BackendResult;
use crate::infrastructure::mcp::McpServerConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::task::ToolArgs;

/// Name, description and input schema of one callable tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }
}

/// One live connection to a tool provider
#[async_trait]
pub trait BackendSession: Send + Sync {
    /// Backend name from configuration
    fn name(&self) -> &str;

    /// Fetch the provider's tool catalog
    async fn list_tools(&self) -> BackendResult<Vec<ToolDescriptor>>;

    /// Execute a tool; `Err` carries the provider's error text
    async fn call_tool(&self, tool: &str, args: ToolArgs) -> BackendResult<Value>;

    /// Close the session and release its process
    async fn shutdown(&self);
}

/// Shared session handle
pub type SessionHandle = Arc<dyn BackendSession>;

/// Establishes sessions from backend configuration
#[async_trait]
pub trait BackendConnector: Send + Sync {
    async fn connect(&self, config: &McpServerConfig) -> BackendResult<SessionHandle>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_wire_names() {
        let tool = ToolDescriptor::new(
            "round",
            "Round a number",
            json!({"type": "object", "properties": {"a": {"type": "number"}}}),
        );
        let value = serde_json::to_value(&tool).unwrap();
        assert_eq!(value["name"], "round");
        assert_eq!(value["inputSchema"]["type"], "object");
        assert!(value.get("input_schema").is_none());
    }
}
