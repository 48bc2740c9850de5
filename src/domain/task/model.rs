//! Task Model
//!
//! Core data structures for tool-call tasks.

use crate::error::{TaskError, TaskResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Arguments passed to a tool call
pub type ToolArgs = Map<String, Value>;

/// Task identifier (random UUID v4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Task execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted, not yet running
    Pending,
    /// Backend call in flight
    Running,
    /// Backend returned a result
    Completed,
    /// Backend returned an error
    Failed,
    /// Cancelled by a caller
    Cancelled,
}

impl TaskStatus {
    /// Check if the task is in a terminal state
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Legal moves: `pending -> running -> {completed, failed}`, and
    /// `cancelled` from any non-terminal state.
    #[must_use]
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial update merged into a record by the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub result: Option<Value>,
    pub error: Option<String>,
}

impl TaskUpdate {
    #[must_use]
    pub fn running() -> Self {
        Self {
            status: Some(TaskStatus::Running),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn completed(result: Value) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            result: Some(result),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            result: None,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            status: Some(TaskStatus::Cancelled),
            ..Default::default()
        }
    }
}

/// Bookkeeping entry for one tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Unique task identifier
    pub id: TaskId,
    /// Tool being invoked
    pub tool: String,
    /// Call arguments
    pub args: ToolArgs,
    /// Current status
    pub status: TaskStatus,
    /// Tool output (when completed)
    pub result: Option<Value>,
    /// Error text (when failed)
    pub error: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// When the backend call began
    pub started_at: Option<DateTime<Utc>>,
    /// When the task reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Create a new pending task
    pub fn new(tool: impl Into<String>, args: ToolArgs) -> Self {
        Self {
            id: TaskId::new(),
            tool: tool.into(),
            args,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Merge an update into the record.
    ///
    /// A status change must be a legal transition; on rejection the
    /// record is left untouched.
    pub fn apply(&mut self, update: TaskUpdate) -> TaskResult<()> {
        if let Some(next) = update.status {
            if !self.status.can_transition_to(next) {
                return Err(TaskError::InvalidStateTransition {
                    from: self.status,
                    to: next,
                });
            }
        } else if self.status.is_terminal() {
            return Err(TaskError::InvalidStateTransition {
                from: self.status,
                to: self.status,
            });
        }

        if let Some(next) = update.status {
            self.status = next;
            let now = Utc::now();
            if next == TaskStatus::Running {
                self.started_at = Some(now);
            }
            if next.is_terminal() {
                self.finished_at = Some(now);
            }
        }
        if let Some(result) = update.result {
            self.result = Some(result);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        Ok(())
    }

    /// Status view handed to subscribers
    #[must_use]
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            status: self.status,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }

    /// Get execution duration in milliseconds
    #[must_use]
    pub fn duration_ms(&self) -> Option<u64> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some(end.signed_duration_since(start).num_milliseconds().max(0) as u64)
    }
}

/// `{status, result, error}` as streamed to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
}
