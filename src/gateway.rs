//! Gateway
//!
//! Owns the catalog, task store, dispatcher, reaper and agent mapping,
//! and exposes the operations served over HTTP.

use crate::app::config::{GatewayConfig, TaskConfig};
use crate::domain::agents::AgentToolMap;
use crate::domain::backend::{BackendConnector, ToolDescriptor};
use crate::domain::catalog::{CatalogAggregator, RefreshReport};
use crate::domain::task::{
    spawn_reaper, subscribe, Dispatcher, StreamEvent, TaskId, TaskRecord, TaskStore, ToolArgs,
};
use crate::error::{GatewayError, Result, TaskError};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Status reported by `/health` and `/reset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Unready,
    Error,
}

/// The tool invocation gateway
pub struct Gateway {
    catalog: Arc<CatalogAggregator>,
    store: Arc<TaskStore>,
    dispatcher: Dispatcher,
    agents: RwLock<AgentToolMap>,
    agent_tools_path: PathBuf,
    tasks: TaskConfig,
    reaper: JoinHandle<()>,
}

impl Gateway {
    /// Build a gateway from configuration.
    ///
    /// Loads the agent mapping and starts the reaper; backends are not
    /// contacted until [`Gateway::refresh`]. Must run inside a tokio runtime.
    pub fn new(config: &GatewayConfig, connector: Arc<dyn BackendConnector>) -> Result<Self> {
        let agent_tools_path = config.agent_tools_path();
        let agents = AgentToolMap::load(&agent_tools_path)?;

        let catalog = Arc::new(CatalogAggregator::new(config.backends.clone(), connector));
        let (store, terminal_events) = TaskStore::with_events();
        let store = Arc::new(store);
        let reaper = spawn_reaper(
            Arc::downgrade(&store),
            terminal_events,
            config.tasks.grace_period(),
        );

        Ok(Self {
            dispatcher: Dispatcher::new(catalog.clone(), store.clone()),
            catalog,
            store,
            agents: RwLock::new(agents),
            agent_tools_path,
            tasks: config.tasks.clone(),
            reaper,
        })
    }

    /// Reconnect all backends and publish a new catalog
    pub async fn refresh(&self) -> RefreshReport {
        self.catalog.refresh().await
    }

    pub fn health(&self) -> ServiceStatus {
        if self.catalog.is_ready() {
            ServiceStatus::Ok
        } else {
            ServiceStatus::Unready
        }
    }

    /// Reload the agent mapping, then refresh the catalog.
    ///
    /// Returns `Error` (and leaves everything untouched) when the mapping
    /// cannot be loaded.
    pub async fn reset(&self) -> ServiceStatus {
        let agents = match AgentToolMap::load(&self.agent_tools_path) {
            Ok(agents) => agents,
            Err(e) => {
                tracing::error!(error = %e, "Reset failed: cannot load agent tools");
                return ServiceStatus::Error;
            }
        };
        *self.agents.write().await = agents;

        let report = self.refresh().await;
        tracing::info!(
            tools = report.tool_count,
            unavailable = report.unavailable.len(),
            "Gateway reset"
        );
        self.health()
    }

    /// Full catalog
    pub async fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.catalog.list_all().await
    }

    /// Catalog as visible to one agent
    pub async fn tools_for_agent(&self, agent: &str) -> Vec<ToolDescriptor> {
        let catalog = self.catalog.snapshot().await;
        self.agents.read().await.filter(agent, catalog.tools())
    }

    /// Submit a tool call; see [`Dispatcher::submit`]
    pub async fn call_tool(&self, tool: &str, args: ToolArgs) -> Result<TaskId> {
        self.dispatcher.submit(tool, args).await
    }

    /// Stream status snapshots for a task
    pub fn subscribe(&self, id: TaskId) -> impl Stream<Item = StreamEvent> + Send + 'static {
        subscribe(self.store.clone(), id, self.tasks.poll_interval())
    }

    /// Read a task record
    pub async fn task(&self, id: &TaskId) -> Result<TaskRecord> {
        self.store.get(id).await.map_err(task_not_found)
    }

    /// Cancel a task (no effect on terminal tasks)
    pub async fn cancel(&self, id: &TaskId) -> Result<TaskRecord> {
        self.store.mark_cancelled(id).await.map_err(task_not_found)
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<CatalogAggregator> {
        &self.catalog
    }

    /// Close every backend session and stop the reaper
    pub async fn shutdown(&self) {
        self.catalog.shutdown().await;
        self.reaper.abort();
        tracing::info!("Gateway stopped");
    }
}

fn task_not_found(err: TaskError) -> GatewayError {
    match err {
        TaskError::NotFound { id } => GatewayError::TaskNotFound { id: id.to_string() },
        other => GatewayError::Task(other),
    }
}
