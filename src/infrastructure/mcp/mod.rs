//! MCP (Model Context Protocol) Integration
//!
//! Backend sessions speaking MCP to tool-provider processes.
//!
//! # Architecture
//!
//! - `client`: rmcp-backed `BackendSession` and `BackendConnector`
//! - `server_config`: Configuration types for backend servers
//! - `tools`: Conversions between rmcp and gateway types
//!
//! # Example
//!
//! ```ignore
//! use toolgate::domain::BackendConnector;
//! use toolgate::infrastructure::mcp::{McpConnector, McpServerConfig};
//!
//! let config = McpServerConfig::script("math", "./math_server.py").with_venv("./venv");
//! let session = McpConnector.connect(&config).await?;
//! let tools = session.list_tools().await?;
//! ```

pub mod client;
pub mod server_config;
pub mod tools;

// Re-export main types
pub use client::{McpBackend, McpConnector};
pub use server_config::{McpServerConfig, McpTransport, ProcessSpec};
pub use tools::{descriptor_from_tool, result_to_value};
