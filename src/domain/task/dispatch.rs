//! Dispatch Engine
//!
//! Validates a tool call, records it as a task and runs the backend call
//! on its own tokio task.

use super::model::{TaskId, TaskUpdate, ToolArgs};
use super::store::{TaskStore, UpdateOutcome};
use crate::domain::backend::SessionHandle;
use crate::domain::catalog::CatalogAggregator;
use crate::error::{BackendError, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Dispatch Engine
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<CatalogAggregator>,
    store: Arc<TaskStore>,
}

impl Dispatcher {
    pub fn new(catalog: Arc<CatalogAggregator>, store: Arc<TaskStore>) -> Self {
        Self { catalog, store }
    }

    /// Accept a call and return its task id immediately.
    ///
    /// Fails with `ToolNotFound` (and creates nothing) when no session
    /// serves the tool.
    pub async fn submit(&self, tool: &str, args: ToolArgs) -> Result<TaskId> {
        let session = self.catalog.lookup(tool).await?;
        let id = self.store.create(tool, args.clone()).await;

        tracing::info!(task_id = %id, tool = %tool, backend = %session.name(), "Task accepted");

        let span = tracing::info_span!("task", task_id = %id, tool = %tool);
        tokio::spawn(
            execute(self.store.clone(), session, id, tool.to_string(), args).instrument(span),
        );

        Ok(id)
    }
}

async fn execute(
    store: Arc<TaskStore>,
    session: SessionHandle,
    id: TaskId,
    tool: String,
    args: ToolArgs,
) {
    match store.update(&id, TaskUpdate::running()).await {
        UpdateOutcome::Applied => {}
        outcome => {
            tracing::debug!(?outcome, "Task no longer pending, skipping backend call");
            return;
        }
    }

    let start = Instant::now();
    let update = match session.call_tool(&tool, args).await {
        Ok(result) => TaskUpdate::completed(result),
        Err(BackendError::ToolCallFailed { error, .. }) => TaskUpdate::failed(error),
        Err(e) => TaskUpdate::failed(e.to_string()),
    };
    let succeeded = update.error.is_none();
    let duration_ms = start.elapsed().as_millis() as u64;

    match store.update(&id, update).await {
        UpdateOutcome::Applied if succeeded => {
            tracing::info!(duration_ms, "Task completed");
        }
        UpdateOutcome::Applied => {
            tracing::warn!(duration_ms, "Task failed");
        }
        UpdateOutcome::Rejected { current } => {
            tracing::info!(%current, duration_ms, "Backend finished after task was closed, result dropped");
        }
        UpdateOutcome::Missing => {
            tracing::debug!(duration_ms, "Task reaped before backend finished");
        }
    }
}
