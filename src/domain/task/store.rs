//! Task Store
//!
//! In-memory table of task records. All status changes go through here
//! and are checked against the lifecycle before being applied.

use super::model::{TaskId, TaskRecord, TaskStatus, TaskUpdate, ToolArgs};
use crate::error::{TaskError, TaskResult};
use std::collections::HashMap;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;

/// Emitted whenever a task enters a terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalEvent {
    pub id: TaskId,
    pub status: TaskStatus,
}

/// Result of merging an update into the store
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The update was merged
    Applied,
    /// No such task (never existed or already reaped)
    Missing,
    /// The transition was illegal; the record is unchanged
    Rejected { current: TaskStatus },
}

/// Task Store
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, TaskRecord>>,
    /// Terminal-event sender (optional)
    event_tx: Option<UnboundedSender<TerminalEvent>>,
}

impl TaskStore {
    /// Create a store without a terminal-event channel
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            event_tx: None,
        }
    }

    /// Create a store that announces terminal transitions
    pub fn with_events() -> (Self, UnboundedReceiver<TerminalEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            tasks: RwLock::new(HashMap::new()),
            event_tx: Some(tx),
        };
        (store, rx)
    }

    fn send_event(&self, id: TaskId, status: TaskStatus) {
        if let Some(ref tx) = self.event_tx {
            let _ = tx.send(TerminalEvent { id, status });
        }
    }

    /// Insert a new pending task and return its id
    pub async fn create(&self, tool: impl Into<String>, args: ToolArgs) -> TaskId {
        let record = TaskRecord::new(tool, args);
        let id = record.id;
        self.tasks.write().await.insert(id, record);
        id
    }

    /// Get a copy of a task record
    pub async fn get(&self, id: &TaskId) -> TaskResult<TaskRecord> {
        self.tasks
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(TaskError::NotFound { id: *id })
    }

    /// Merge fields into a task (check-then-set)
    pub async fn update(&self, id: &TaskId, update: TaskUpdate) -> UpdateOutcome {
        let mut tasks = self.tasks.write().await;
        let Some(record) = tasks.get_mut(id) else {
            return UpdateOutcome::Missing;
        };

        let current = record.status;
        match record.apply(update) {
            Ok(()) => {
                if record.status.is_terminal() && !current.is_terminal() {
                    self.send_event(*id, record.status);
                }
                UpdateOutcome::Applied
            }
            Err(e) => {
                tracing::debug!(task_id = %id, error = %e, "Task update rejected");
                UpdateOutcome::Rejected { current }
            }
        }
    }

    /// Cancel a non-terminal task; a terminal task is returned unchanged
    pub async fn mark_cancelled(&self, id: &TaskId) -> TaskResult<TaskRecord> {
        let mut tasks = self.tasks.write().await;
        let record = tasks.get_mut(id).ok_or(TaskError::NotFound { id: *id })?;

        if !record.status.is_terminal() {
            record.apply(TaskUpdate::cancelled())?;
            self.send_event(*id, TaskStatus::Cancelled);
            tracing::info!(task_id = %id, tool = %record.tool, "Task cancelled");
        }
        Ok(record.clone())
    }

    /// Remove a task record
    pub async fn remove(&self, id: &TaskId) -> Option<TaskRecord> {
        self.tasks.write().await.remove(id)
    }

    /// Get number of tracked tasks
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_and_get() {
        let store = TaskStore::new();
        let id = store.create("round", ToolArgs::new()).await;

        let record = store.get(&id).await.unwrap();
        assert_eq!(record.tool, "round");
        assert_eq!(record.status, TaskStatus::Pending);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = TaskStore::new();
        let id = TaskId::new();
        assert_eq!(store.get(&id).await.unwrap_err(), TaskError::NotFound { id });
    }

    #[tokio::test]
    async fn test_update_outcomes() {
        let store = TaskStore::new();
        let id = store.create("round", ToolArgs::new()).await;

        assert_eq!(store.update(&id, TaskUpdate::running()).await, UpdateOutcome::Applied);
        assert_eq!(
            store.update(&id, TaskUpdate::running()).await,
            UpdateOutcome::Rejected {
                current: TaskStatus::Running
            }
        );
        assert_eq!(
            store.update(&TaskId::new(), TaskUpdate::running()).await,
            UpdateOutcome::Missing
        );
    }

    #[tokio::test]
    async fn test_terminal_events() {
        let (store, mut rx) = TaskStore::with_events();
        let id = store.create("round", ToolArgs::new()).await;

        store.update(&id, TaskUpdate::running()).await;
        assert!(rx.try_recv().is_err());

        store.update(&id, TaskUpdate::completed(json!(1.23))).await;
        assert_eq!(
            rx.try_recv().unwrap(),
            TerminalEvent {
                id,
                status: TaskStatus::Completed
            }
        );

        // Re-cancelling a terminal task announces nothing
        store.mark_cancelled(&id).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_then_complete() {
        let (store, mut rx) = TaskStore::with_events();
        let id = store.create("slow", ToolArgs::new()).await;
        store.update(&id, TaskUpdate::running()).await;

        let record = store.mark_cancelled(&id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Cancelled);
        assert_eq!(rx.try_recv().unwrap().status, TaskStatus::Cancelled);

        let outcome = store.update(&id, TaskUpdate::completed(json!("done"))).await;
        assert_eq!(
            outcome,
            UpdateOutcome::Rejected {
                current: TaskStatus::Cancelled
            }
        );
        let record = store.get(&id).await.unwrap();
        assert_eq!(record.status, TaskStatus::Cancelled);
        assert!(record.result.is_none());
    }

    #[tokio::test]
    async fn test_cancel_completed_is_unchanged() {
        let store = TaskStore::new();
        let id = store.create("round", ToolArgs::new()).await;
        store.update(&id, TaskUpdate::running()).await;
        store.update(&id, TaskUpdate::failed("boom")).await;

        let before = store.get(&id).await.unwrap();
        let after = store.mark_cancelled(&id).await.unwrap();
        assert_eq!(before, after);
        assert_eq!(after.error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_cancel_missing() {
        let store = TaskStore::new();
        assert!(matches!(
            store.mark_cancelled(&TaskId::new()).await,
            Err(TaskError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove() {
        let store = TaskStore::new();
        let id = store.create("round", ToolArgs::new()).await;
        assert!(store.remove(&id).await.is_some());
        assert!(store.remove(&id).await.is_none());
        assert!(store.is_empty().await);
    }
}
