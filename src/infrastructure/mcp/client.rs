//! MCP Client
//!
//! Backend sessions over the Model Context Protocol, via rmcp.

use crate::domain::backend::{BackendConnector, BackendSession, SessionHandle, ToolDescriptor};
use crate::domain::task::ToolArgs;
use crate::error::{BackendError, BackendResult};
use crate::infrastructure::mcp::server_config::{McpServerConfig, McpTransport, ProcessSpec};
use crate::infrastructure::mcp::tools::{descriptor_from_tool, result_to_value};
use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParam, ClientInfo},
    service::{Peer, RunningService},
    transport::{StreamableHttpClientTransport, TokioChildProcess},
    RoleClient, ServiceExt,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::Mutex;

type ClientService = RunningService<RoleClient, ClientInfo>;

/// A connected MCP server
pub struct McpBackend {
    /// Backend name from configuration
    name: String,
    /// Request handle; clones share the underlying connection
    peer: Peer<RoleClient>,
    /// Owning service, taken on shutdown
    service: Mutex<Option<ClientService>>,
}

impl McpBackend {
    /// Connect to the server described by `config`
    pub async fn connect(config: &McpServerConfig) -> BackendResult<Self> {
        let service = match &config.transport {
            McpTransport::Http { url } => connect_http(&config.name, url).await?,
            McpTransport::Stdio { .. } | McpTransport::Script { .. } => {
                let spec = config.process_spec()?.ok_or_else(|| {
                    BackendError::InvalidConfig(format!("no process for backend '{}'", config.name))
                })?;
                connect_stdio(&config.name, spec).await?
            }
        };

        if let Some(info) = service.peer().peer_info() {
            tracing::debug!(
                backend = %config.name,
                server = %info.server_info.name,
                version = %info.server_info.version,
                "MCP session initialized"
            );
        }

        Ok(Self {
            name: config.name.clone(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
        })
    }
}

async fn connect_stdio(backend: &str, spec: ProcessSpec) -> BackendResult<ClientService> {
    tracing::debug!(backend, command = %spec.command, args = ?spec.args, "Spawning backend process");

    let mut cmd = Command::new(&spec.command);
    cmd.args(&spec.args);

    if let Some(dir) = &spec.working_dir {
        cmd.current_dir(dir);
    }

    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    let transport = TokioChildProcess::new(cmd).map_err(|e| BackendError::ConnectionFailed {
        backend: backend.to_string(),
        reason: e.to_string(),
    })?;

    ClientInfo::default()
        .serve(transport)
        .await
        .map_err(|e| BackendError::ConnectionFailed {
            backend: backend.to_string(),
            reason: e.to_string(),
        })
}

async fn connect_http(backend: &str, url: &str) -> BackendResult<ClientService> {
    tracing::debug!(backend, url, "Connecting to HTTP backend");

    let transport = StreamableHttpClientTransport::from_uri(url.to_string());

    ClientInfo::default()
        .serve(transport)
        .await
        .map_err(|e| BackendError::ConnectionFailed {
            backend: backend.to_string(),
            reason: e.to_string(),
        })
}

#[async_trait]
impl BackendSession for McpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> BackendResult<Vec<ToolDescriptor>> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| BackendError::Protocol(e.to_string()))?;

        Ok(tools.iter().map(descriptor_from_tool).collect())
    }

    async fn call_tool(&self, tool: &str, args: ToolArgs) -> BackendResult<Value> {
        let params = CallToolRequestParam {
            name: tool.to_string().into(),
            arguments: Some(args),
            task: None,
        };

        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| BackendError::ToolCallFailed {
                tool: tool.to_string(),
                error: e.to_string(),
            })?;

        result_to_value(&result).map_err(|error| BackendError::ToolCallFailed {
            tool: tool.to_string(),
            error,
        })
    }

    async fn shutdown(&self) {
        if let Some(service) = self.service.lock().await.take() {
            if let Err(e) = service.cancel().await {
                tracing::warn!(backend = %self.name, error = %e, "Backend did not shut down cleanly");
            }
        }
    }
}

/// Opens rmcp sessions for configured backends
#[derive(Debug, Clone, Copy, Default)]
pub struct McpConnector;

#[async_trait]
impl BackendConnector for McpConnector {
    async fn connect(&self, config: &McpServerConfig) -> BackendResult<SessionHandle> {
        let backend = McpBackend::connect(config).await?;
        Ok(Arc::new(backend))
    }
}
