//! Fake tool backends shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use toolgate::app::GatewayConfig;
use toolgate::domain::task::ToolArgs;
use toolgate::domain::{BackendConnector, BackendSession, SessionHandle, ToolDescriptor};
use toolgate::error::{BackendError, BackendResult};
use toolgate::infrastructure::mcp::McpServerConfig;

/// How a fake tool behaves when called
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Round `a` to two decimals
    Round,
    /// Return the arguments unchanged
    Echo,
    /// Sleep, then return `"done"`
    Slow(Duration),
    /// Fail with a fixed message
    Fail,
}

#[derive(Clone)]
pub struct FakeBackend {
    pub tools: Vec<(&'static str, Behavior)>,
}

impl FakeBackend {
    pub fn math() -> Self {
        Self {
            tools: vec![
                ("round", Behavior::Round),
                ("slow_sum", Behavior::Slow(Duration::from_secs(5))),
                ("divide_by_zero", Behavior::Fail),
            ],
        }
    }

    pub fn text() -> Self {
        Self {
            tools: vec![("echo", Behavior::Echo), ("round", Behavior::Echo)],
        }
    }
}

struct FakeSession {
    name: String,
    backend: FakeBackend,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl BackendSession for FakeSession {
    fn name(&self) -> &str {
        &self.name
    }

    async fn list_tools(&self) -> BackendResult<Vec<ToolDescriptor>> {
        Ok(self
            .backend
            .tools
            .iter()
            .map(|(name, _)| {
                ToolDescriptor::new(
                    *name,
                    format!("{name} from {}", self.name),
                    json!({"type": "object"}),
                )
            })
            .collect())
    }

    async fn call_tool(&self, tool: &str, args: ToolArgs) -> BackendResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .backend
            .tools
            .iter()
            .find(|(name, _)| *name == tool)
            .map(|(_, b)| *b)
            .ok_or_else(|| BackendError::ToolCallFailed {
                tool: tool.into(),
                error: "unknown tool".into(),
            })?;

        match behavior {
            Behavior::Round => {
                let a = args.get("a").and_then(Value::as_f64).unwrap_or_default();
                Ok(json!((a * 100.0).round() / 100.0))
            }
            Behavior::Echo => Ok(Value::Object(args)),
            Behavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(json!("done"))
            }
            Behavior::Fail => Err(BackendError::ToolCallFailed {
                tool: tool.into(),
                error: "division by zero".into(),
            }),
        }
    }

    async fn shutdown(&self) {}
}

/// Connector serving fake backends by name; unknown names fail to connect
#[derive(Clone, Default)]
pub struct FakeConnector {
    backends: HashMap<String, FakeBackend>,
    pub calls: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, name: &str, backend: FakeBackend) -> Self {
        self.backends.insert(name.to_string(), backend);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendConnector for FakeConnector {
    async fn connect(&self, config: &McpServerConfig) -> BackendResult<SessionHandle> {
        let backend = self
            .backends
            .get(&config.name)
            .cloned()
            .ok_or_else(|| BackendError::ConnectionFailed {
                backend: config.name.clone(),
                reason: "process exited during initialization".into(),
            })?;
        Ok(Arc::new(FakeSession {
            name: config.name.clone(),
            backend,
            calls: self.calls.clone(),
        }))
    }
}

/// Config registering `names` as backends, with agent tools at `agent_tools`
pub fn config_for(names: &[&str], agent_tools: &Path) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.agent_tools = agent_tools.to_path_buf();
    config.backends = names
        .iter()
        .map(|name| McpServerConfig::http(*name, format!("http://{name}.invalid/mcp")))
        .collect();
    config
}

pub fn args(value: Value) -> ToolArgs {
    value.as_object().cloned().unwrap_or_default()
}
