//! Catalog Aggregator
//!
//! Merges the tool catalogs of all backend sessions into one
//! name-indexed registry. The registry is an immutable snapshot that is
//! swapped whole on refresh.

use super::backend::{BackendConnector, SessionHandle, ToolDescriptor};
use crate::error::{BackendError, BackendResult, GatewayError, Result};
use crate::infrastructure::mcp::McpServerConfig;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Immutable aggregate of all live sessions' tools
#[derive(Default)]
pub struct Catalog {
    /// Sessions in registration order
    sessions: Vec<SessionHandle>,
    /// Tools in session order, then per-session catalog order
    tools: Vec<ToolDescriptor>,
    /// Tool name -> index into `sessions`
    owners: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog; the first session to declare a name keeps it
    pub fn build(entries: Vec<(SessionHandle, Vec<ToolDescriptor>)>) -> Self {
        let mut catalog = Catalog::default();

        for (session, tools) in entries {
            let index = catalog.sessions.len();
            for tool in tools {
                if let Some(&owner) = catalog.owners.get(&tool.name) {
                    tracing::warn!(
                        tool = %tool.name,
                        kept = %catalog.sessions[owner].name(),
                        dropped = %session.name(),
                        "Duplicate tool name, keeping first registration"
                    );
                    continue;
                }
                catalog.owners.insert(tool.name.clone(), index);
                catalog.tools.push(tool);
            }
            catalog.sessions.push(session);
        }

        catalog
    }

    /// Find the session serving a tool
    pub fn lookup(&self, tool: &str) -> Option<SessionHandle> {
        self.owners.get(tool).map(|&i| self.sessions[i].clone())
    }

    /// All tool descriptors in catalog order
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn sessions(&self) -> &[SessionHandle] {
        &self.sessions
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

/// Outcome of a refresh
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Backends that connected and listed their tools
    pub connected: Vec<String>,
    /// Backends that could not be reached (`BackendUnavailable`)
    pub unavailable: Vec<GatewayError>,
    /// Tools published in the new catalog
    pub tool_count: usize,
}

impl RefreshReport {
    pub fn is_complete(&self) -> bool {
        self.unavailable.is_empty()
    }
}

/// Catalog Aggregator
pub struct CatalogAggregator {
    backends: Vec<McpServerConfig>,
    connector: Arc<dyn BackendConnector>,
    current: RwLock<Arc<Catalog>>,
    ready: AtomicBool,
    /// Serializes refreshes so sessions are never orphaned
    refresh_lock: Mutex<()>,
}

impl CatalogAggregator {
    pub fn new(backends: Vec<McpServerConfig>, connector: Arc<dyn BackendConnector>) -> Self {
        Self {
            backends,
            connector,
            current: RwLock::new(Arc::new(Catalog::default())),
            ready: AtomicBool::new(false),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Reconnect every enabled backend and publish a fresh catalog
    pub async fn refresh(&self) -> RefreshReport {
        let _guard = self.refresh_lock.lock().await;

        let enabled: Vec<&McpServerConfig> = self.backends.iter().filter(|b| b.enabled).collect();
        tracing::info!(backends = enabled.len(), "Refreshing tool catalog");

        let results = join_all(enabled.iter().map(|config| self.connect_one(config))).await;

        let mut report = RefreshReport::default();
        let mut entries = Vec::new();
        for (config, result) in enabled.iter().zip(results) {
            match result {
                Ok(entry) => {
                    tracing::info!(backend = %config.name, tools = entry.1.len(), "Backend connected");
                    report.connected.push(config.name.clone());
                    entries.push(entry);
                }
                Err(e) => {
                    tracing::warn!(backend = %config.name, error = %e, "Backend unavailable");
                    report.unavailable.push(GatewayError::BackendUnavailable {
                        backend: config.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let catalog = Arc::new(Catalog::build(entries));
        report.tool_count = catalog.tool_count();

        let previous = {
            let mut current = self.current.write().await;
            std::mem::replace(&mut *current, catalog)
        };
        self.ready.store(true, Ordering::SeqCst);

        shutdown_sessions(previous.sessions()).await;

        tracing::info!(
            tools = report.tool_count,
            connected = report.connected.len(),
            unavailable = report.unavailable.len(),
            "Tool catalog published"
        );
        report
    }

    async fn connect_one(
        &self,
        config: &McpServerConfig,
    ) -> BackendResult<(SessionHandle, Vec<ToolDescriptor>)> {
        let limit = Duration::from_millis(config.timeout_ms);
        let timed_out = || BackendError::Timeout {
            backend: config.name.clone(),
            timeout_ms: config.timeout_ms,
        };

        let session = tokio::time::timeout(limit, self.connector.connect(config))
            .await
            .map_err(|_| timed_out())??;

        match tokio::time::timeout(limit, session.list_tools()).await {
            Ok(Ok(tools)) => Ok((session, tools)),
            Ok(Err(e)) => {
                session.shutdown().await;
                Err(e)
            }
            Err(_) => {
                session.shutdown().await;
                Err(timed_out())
            }
        }
    }

    /// Current catalog snapshot
    pub async fn snapshot(&self) -> Arc<Catalog> {
        self.current.read().await.clone()
    }

    /// Find the session serving a tool
    pub async fn lookup(&self, tool: &str) -> Result<SessionHandle> {
        self.snapshot()
            .await
            .lookup(tool)
            .ok_or_else(|| GatewayError::ToolNotFound {
                tool: tool.to_string(),
            })
    }

    /// All tools in catalog order
    pub async fn list_all(&self) -> Vec<ToolDescriptor> {
        self.snapshot().await.tools().to_vec()
    }

    /// True once the first refresh finished
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Drop the catalog and close every session
    pub async fn shutdown(&self) {
        let _guard = self.refresh_lock.lock().await;
        let previous = {
            let mut current = self.current.write().await;
            std::mem::take(&mut *current)
        };
        self.ready.store(false, Ordering::SeqCst);
        shutdown_sessions(previous.sessions()).await;
        tracing::info!("All backend sessions closed");
    }
}

async fn shutdown_sessions(sessions: &[SessionHandle]) {
    join_all(sessions.iter().map(|s| async move {
        tracing::debug!(backend = %s.name(), "Closing backend session");
        s.shutdown().await;
    }))
    .await;
}
